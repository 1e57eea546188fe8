use crate::error::{FetcherError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Dominican Republic bounding box: south, west, north, east.
pub const DOMINICAN_REPUBLIC_BBOX: BoundingBox = BoundingBox {
    south: 17.36,
    west: -72.01,
    north: 19.93,
    east: -68.32,
};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrimarySourceConfig {
    /// Base URL of the government CKAN API, e.g. `https://datos.gob.do/api/3`.
    pub base_url: String,
    /// CKAN dataset identifier for the national school registry.
    pub dataset_id: String,
    /// Timeout for the lightweight connectivity probe, in seconds.
    pub probe_timeout_seconds: u64,
    /// Timeout for the dataset lookup, in seconds.
    pub fetch_timeout_seconds: u64,
}

impl Default for PrimarySourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://datos.gob.do/api/3".to_string(),
            dataset_id: "centros-educativos-de-republica-dominicana".to_string(),
            probe_timeout_seconds: 10,
            fetch_timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecondarySourceConfig {
    /// Overpass API interpreter endpoint.
    pub url: String,
    /// Timeout for the full fetch, in seconds.
    pub timeout_seconds: u64,
    pub bounding_box: BoundingBox,
}

impl Default for SecondarySourceConfig {
    fn default() -> Self {
        Self {
            url: "https://overpass-api.de/api/interpreter".to_string(),
            timeout_seconds: 60,
            bounding_box: DOMINICAN_REPUBLIC_BBOX,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub primary: PrimarySourceConfig,
    pub secondary: SecondarySourceConfig,
    /// Directory where export files are written.
    pub output_dir: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            primary: PrimarySourceConfig::default(),
            secondary: SecondarySourceConfig::default(),
            output_dir: "storage/app".to_string(),
        }
    }
}

impl FetcherConfig {
    /// Loads configuration from a TOML file. Missing keys fall back to the
    /// live Dominican Republic endpoints.
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FetcherError::Config(format!("Failed to read config file '{}': {}", path, e))
        })?;
        let config: FetcherConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
