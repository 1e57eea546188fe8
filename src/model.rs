use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Free-form key/value tags on a raw geodata element.
///
/// OSM tags carry no schema; fields that can be spelled several ways are
/// resolved with [`Tags::first_present`] against a fixed priority order.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Tags(HashMap<String, String>);

impl Tags {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns the value of the first key present, in the given order.
    /// Values are never merged across keys.
    pub fn first_present(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Tags {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Tags(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

/// One element as returned by the Overpass API: a node, way or relation
/// with optional direct coordinates, an optional computed center for
/// non-point geometries, and free-form tags.
#[derive(Debug, Clone, Deserialize)]
pub struct RawElement {
    pub id: i64,
    #[serde(rename = "type")]
    pub element_type: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub center: Option<Center>,
    #[serde(default)]
    pub tags: Tags,
}

/// Canonical flat representation of one educational institution.
///
/// Field order here is the export order: the CSV header and the JSON key
/// order both follow this struct. Immutable once built by the normalizer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SchoolRecord {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub address: String,
    pub education_level: Option<String>,
    pub operator: Option<String>,
    pub operator_type: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub capacity: Option<String>,
    pub grades: Option<String>,
    pub language: Option<String>,
    pub denomination: Option<String>,
    pub gender_policy: Option<String>,
    pub wheelchair_access: Option<String>,
    pub retrieved_at: DateTime<Utc>,
    pub data_source: String,
    pub source_native_id: i64,
    pub source_native_type: String,
}

/// The upstream that actually produced a run's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceKind {
    Government,
    OpenStreetMap,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Government => "Government CKAN API",
            SourceKind::OpenStreetMap => "OpenStreetMap",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one pipeline run: the normalized records plus provenance
/// metadata. Built once per run and handed straight to the exporter.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub schools: Vec<SchoolRecord>,
    pub source_used: SourceKind,
    /// Whether the primary dataset lookup ran (the connectivity probe
    /// succeeded). A fallback with this set means the government API was
    /// reachable but published no school records.
    pub primary_attempted: bool,
    pub total_count: usize,
    pub generated_at: DateTime<Utc>,
}
