use crate::config::FetcherConfig;
use crate::error::Result;
use crate::export::{Exporter, OutputFormat};
use crate::model::{FetchResult, SchoolRecord, SourceKind};
use crate::normalize::normalize;
use crate::sources::SourceResolver;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub format: OutputFormat,
    /// Keep only the first N resolved records; 0 means unlimited.
    pub limit: usize,
}

/// What the caller needs to report a run: provenance, counts and the file.
#[derive(Debug)]
pub struct PipelineReport {
    pub source_used: SourceKind,
    pub primary_attempted: bool,
    pub total_count: usize,
    pub output_path: PathBuf,
    pub generated_at: DateTime<Utc>,
}

/// The one entry point for fetching school data. Every caller (CLI or
/// otherwise) goes through here; resolve, normalize, limit and export are
/// never reimplemented at a call site.
pub async fn run_pipeline(config: &FetcherConfig, options: &PipelineOptions) -> Result<PipelineReport> {
    let resolver = SourceResolver::from_config(config);
    let exporter = Exporter::new(&config.output_dir);
    run_with(&resolver, &exporter, options).await
}

/// Pipeline body over injected collaborators, so tests can substitute mock
/// sources and a temp-dir exporter.
#[instrument(skip(resolver, exporter))]
pub async fn run_with(
    resolver: &SourceResolver,
    exporter: &Exporter,
    options: &PipelineOptions,
) -> Result<PipelineReport> {
    let resolution = resolver.resolve().await?;
    info!(
        "Resolved {} elements from {}",
        resolution.elements.len(),
        resolution.source
    );

    let generated_at = Utc::now();
    let mut schools: Vec<SchoolRecord> = resolution
        .elements
        .iter()
        .map(|element| normalize(element, resolution.source, generated_at))
        .collect();

    if options.limit > 0 && schools.len() > options.limit {
        warn!("Limiting output to the first {} records", options.limit);
        schools.truncate(options.limit);
    }

    let result = FetchResult {
        total_count: schools.len(),
        schools,
        source_used: resolution.source,
        primary_attempted: resolution.primary_attempted,
        generated_at,
    };

    let output_path = exporter.export(&result, options.format)?;

    Ok(PipelineReport {
        source_used: result.source_used,
        primary_attempted: result.primary_attempted,
        total_count: result.total_count,
        output_path,
        generated_at,
    })
}
