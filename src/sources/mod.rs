use crate::error::Result;
use crate::model::RawElement;

pub mod ckan;
pub mod overpass;
pub mod resolver;

pub use ckan::CkanClient;
pub use overpass::OverpassClient;
pub use resolver::{Resolution, SourceResolver};

/// The preferred government open-data source.
///
/// Probing and fetching are separate on purpose: the portal has a history of
/// answering its status endpoint while publishing no school records, so a
/// reachable API must not be taken as available data.
#[async_trait::async_trait]
pub trait PrimarySource: Send + Sync {
    /// Lightweight connectivity check. `Ok(true)` means the API answered and
    /// reported itself healthy; anything else suppresses the dataset lookup.
    async fn probe(&self) -> Result<bool>;

    /// Retrieves the actual school dataset. May legitimately be empty.
    async fn fetch_dataset(&self) -> Result<Vec<RawElement>>;
}

/// The community-maintained fallback source (OpenStreetMap).
#[async_trait::async_trait]
pub trait SecondarySource: Send + Sync {
    async fn fetch_schools(&self) -> Result<Vec<RawElement>>;
}
