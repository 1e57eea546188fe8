use crate::config::FetcherConfig;
use crate::error::{FetcherError, Result};
use crate::model::{RawElement, SourceKind};
use crate::sources::{CkanClient, OverpassClient, PrimarySource, SecondarySource};
use tracing::{info, instrument, warn};

/// The outcome of source selection: the raw elements plus which upstream
/// actually produced them.
#[derive(Debug)]
pub struct Resolution {
    pub elements: Vec<RawElement>,
    pub source: SourceKind,
    /// True when the primary dataset lookup ran (the probe succeeded).
    pub primary_attempted: bool,
}

/// Decides which upstream supplies a run's data: government first, falling
/// back to OpenStreetMap. Each source is attempted exactly once; there is
/// no retry loop.
pub struct SourceResolver {
    primary: Box<dyn PrimarySource>,
    secondary: Box<dyn SecondarySource>,
}

impl SourceResolver {
    pub fn new(primary: Box<dyn PrimarySource>, secondary: Box<dyn SecondarySource>) -> Self {
        Self { primary, secondary }
    }

    /// Wires up the live CKAN and Overpass clients.
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self::new(
            Box::new(CkanClient::new(config.primary.clone())),
            Box::new(OverpassClient::new(config.secondary.clone())),
        )
    }

    /// Primary-then-fallback resolution.
    ///
    /// Primary failures at any stage (probe, lookup, empty dataset) are
    /// recoverable and only logged; secondary failures are terminal for the
    /// run. An empty result from both sources is `SourceUnavailable`.
    #[instrument(skip(self))]
    pub async fn resolve(&self) -> Result<Resolution> {
        let mut primary_attempted = false;

        match self.primary.probe().await {
            Ok(true) => {
                primary_attempted = true;
                match self.primary.fetch_dataset().await {
                    Ok(elements) if !elements.is_empty() => {
                        info!("Using {} records from the government source", elements.len());
                        return Ok(Resolution {
                            elements,
                            source: SourceKind::Government,
                            primary_attempted,
                        });
                    }
                    Ok(_) => {
                        warn!("Government source reachable but published no school records")
                    }
                    Err(e) => warn!("Government dataset lookup failed: {}", e),
                }
            }
            Ok(false) => info!("Government API not responding, skipping dataset lookup"),
            Err(e) => warn!("Government API probe failed: {}", e),
        }

        info!("Falling back to OpenStreetMap");
        let elements = self.secondary.fetch_schools().await?;
        if elements.is_empty() {
            return Err(FetcherError::SourceUnavailable {
                message: "neither the government source nor OpenStreetMap returned any records"
                    .to_string(),
            });
        }

        Ok(Resolution {
            elements,
            source: SourceKind::OpenStreetMap,
            primary_attempted,
        })
    }
}
