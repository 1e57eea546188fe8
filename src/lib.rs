//! Dominican Republic school data fetcher.
//!
//! One pipeline: resolve a data source (government open-data portal first,
//! OpenStreetMap Overpass as fallback), normalize raw geodata elements into
//! flat school records, and export them to CSV or JSON.

pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod sources;

pub use config::FetcherConfig;
pub use error::{FetcherError, Result};
pub use export::{Exporter, OutputFormat};
pub use model::{FetchResult, RawElement, SchoolRecord, SourceKind};
pub use pipeline::{run_pipeline, PipelineOptions, PipelineReport};
pub use sources::{PrimarySource, SecondarySource, SourceResolver};
