use crate::config::SecondarySourceConfig;
use crate::error::{FetcherError, Result};
use crate::model::RawElement;
use crate::sources::SecondarySource;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Amenity categories that count as educational institutions.
const AMENITY_CATEGORIES: [&str; 3] = ["school", "university", "college"];

/// Geometry kinds requested; ways and relations are returned with a
/// computed `center` via `out center`.
const ELEMENT_KINDS: [&str; 3] = ["node", "way", "relation"];

/// How many characters of an unparsable response to keep for diagnostics.
const SNIPPET_LEN: usize = 200;

/// Client for the OpenStreetMap Overpass API.
pub struct OverpassClient {
    client: reqwest::Client,
    config: SecondarySourceConfig,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    elements: Vec<RawElement>,
}

impl OverpassClient {
    pub fn new(config: SecondarySourceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Builds the Overpass QL query: every amenity category crossed with
    /// every geometry kind, restricted to the configured bounding box.
    pub fn build_query(&self) -> String {
        let bbox = self.config.bounding_box;
        let mut query = String::from("[out:json][timeout:25];\n(\n");
        for category in AMENITY_CATEGORIES {
            for kind in ELEMENT_KINDS {
                query.push_str(&format!(
                    "  {}[\"amenity\"=\"{}\"]({},{},{},{});\n",
                    kind, category, bbox.south, bbox.west, bbox.north, bbox.east
                ));
            }
        }
        query.push_str(");\nout center meta;");
        query
    }
}

#[async_trait::async_trait]
impl SecondarySource for OverpassClient {
    #[instrument(skip(self))]
    async fn fetch_schools(&self) -> Result<Vec<RawElement>> {
        let query = self.build_query();
        debug!("Sending Overpass query ({} chars) to {}", query.len(), self.config.url);

        let response = self
            .client
            .post(&self.config.url)
            .header("User-Agent", "DominicanSchoolsFetcher/2.0")
            .form(&[("data", query.as_str())])
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .send()
            .await
            .map_err(|e| FetcherError::SourceUnavailable {
                message: format!("Failed to connect to OpenStreetMap Overpass API: {}", e),
            })?;

        let body = response
            .text()
            .await
            .map_err(|e| FetcherError::SourceUnavailable {
                message: format!("Failed to read Overpass response: {}", e),
            })?;

        let parsed: OverpassResponse =
            serde_json::from_str(&body).map_err(|_| FetcherError::InvalidResponseFormat {
                snippet: body.chars().take(SNIPPET_LEN).collect(),
            })?;

        info!("Overpass returned {} school elements", parsed.elements.len());
        Ok(parsed.elements)
    }
}
