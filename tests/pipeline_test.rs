use anyhow::Result;
use dr_schools_fetcher::error::FetcherError;
use dr_schools_fetcher::export::{Exporter, OutputFormat, CSV_COLUMNS};
use dr_schools_fetcher::model::{RawElement, SourceKind};
use dr_schools_fetcher::pipeline::{run_with, PipelineOptions};
use dr_schools_fetcher::sources::{PrimarySource, SecondarySource, SourceResolver};
use std::fs;
use tempfile::tempdir;

struct StubPrimary {
    reachable: bool,
    dataset: Vec<RawElement>,
}

#[async_trait::async_trait]
impl PrimarySource for StubPrimary {
    async fn probe(&self) -> dr_schools_fetcher::Result<bool> {
        Ok(self.reachable)
    }

    async fn fetch_dataset(&self) -> dr_schools_fetcher::Result<Vec<RawElement>> {
        Ok(self.dataset.clone())
    }
}

struct StubSecondary {
    elements: Vec<RawElement>,
}

#[async_trait::async_trait]
impl SecondarySource for StubSecondary {
    async fn fetch_schools(&self) -> dr_schools_fetcher::Result<Vec<RawElement>> {
        Ok(self.elements.clone())
    }
}

struct FailingSecondary;

#[async_trait::async_trait]
impl SecondarySource for FailingSecondary {
    async fn fetch_schools(&self) -> dr_schools_fetcher::Result<Vec<RawElement>> {
        Err(FetcherError::SourceUnavailable {
            message: "connection timed out".to_string(),
        })
    }
}

fn osm_school(id: i64, name: &str) -> RawElement {
    serde_json::from_value(serde_json::json!({
        "type": "node",
        "id": id,
        "lat": 18.5,
        "lon": -69.9,
        "tags": {
            "amenity": "school",
            "name": name,
            "addr:street": "Calle 1",
            "addr:housenumber": "23"
        }
    }))
    .unwrap()
}

fn resolver(primary: StubPrimary, elements: Vec<RawElement>) -> SourceResolver {
    SourceResolver::new(Box::new(primary), Box::new(StubSecondary { elements }))
}

fn unreachable_primary() -> StubPrimary {
    StubPrimary {
        reachable: false,
        dataset: Vec::new(),
    }
}

#[tokio::test]
async fn full_run_falls_back_and_exports_csv() -> Result<()> {
    let dir = tempdir()?;
    let elements: Vec<RawElement> = (1..=3).map(|i| osm_school(i, &format!("Escuela {}", i))).collect();
    let resolver = resolver(unreachable_primary(), elements);
    let exporter = Exporter::new(dir.path());

    let options = PipelineOptions {
        format: OutputFormat::Csv,
        limit: 0,
    };
    let report = run_with(&resolver, &exporter, &options).await?;

    assert_eq!(report.source_used, SourceKind::OpenStreetMap);
    assert!(!report.primary_attempted);
    assert_eq!(report.total_count, 3);

    let mut reader = csv::Reader::from_path(&report.output_path)?;
    assert_eq!(reader.headers()?.iter().collect::<Vec<_>>(), CSV_COLUMNS.to_vec());

    let rows: Vec<csv::StringRecord> = reader.records().collect::<std::result::Result<_, _>>()?;
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][1], "Escuela 1");
    assert_eq!(&rows[0][8], "Calle 1, 23");
    assert_eq!(&rows[2][22], "OpenStreetMap");
    Ok(())
}

#[tokio::test]
async fn limit_keeps_the_first_records_in_order() -> Result<()> {
    let dir = tempdir()?;
    let elements: Vec<RawElement> = (1..=20).map(|i| osm_school(i, &format!("Escuela {}", i))).collect();
    let resolver = resolver(unreachable_primary(), elements);
    let exporter = Exporter::new(dir.path());

    let options = PipelineOptions {
        format: OutputFormat::Csv,
        limit: 5,
    };
    let report = run_with(&resolver, &exporter, &options).await?;
    assert_eq!(report.total_count, 5);

    let mut reader = csv::Reader::from_path(&report.output_path)?;
    let ids: Vec<String> = reader
        .records()
        .map(|r| r.unwrap()[0].to_string())
        .collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    Ok(())
}

#[tokio::test]
async fn primary_data_is_preferred_when_published() -> Result<()> {
    let dir = tempdir()?;
    let primary = StubPrimary {
        reachable: true,
        dataset: vec![osm_school(100, "Centro Educativo Oficial")],
    };
    let resolver = resolver(primary, vec![osm_school(1, "Escuela OSM")]);
    let exporter = Exporter::new(dir.path());

    let options = PipelineOptions {
        format: OutputFormat::Json,
        limit: 0,
    };
    let report = run_with(&resolver, &exporter, &options).await?;

    assert_eq!(report.source_used, SourceKind::Government);
    assert!(report.primary_attempted);

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report.output_path)?)?;
    assert_eq!(value["metadata"]["source_used"], "Government CKAN API");
    assert_eq!(value["metadata"]["data_source_status"], "primary_source_successful");
    assert_eq!(value["schools"][0]["name"], "Centro Educativo Oficial");
    assert_eq!(value["schools"][0]["data_source"], "Government CKAN API");
    Ok(())
}

#[tokio::test]
async fn json_export_reports_fallback_metadata() -> Result<()> {
    let dir = tempdir()?;
    let resolver = resolver(unreachable_primary(), vec![osm_school(1, "Escuela 1")]);
    let exporter = Exporter::new(dir.path());

    let options = PipelineOptions {
        format: OutputFormat::Json,
        limit: 0,
    };
    let report = run_with(&resolver, &exporter, &options).await?;

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report.output_path)?)?;
    assert_eq!(value["metadata"]["total_count"], 1);
    assert_eq!(value["metadata"]["source_used"], "OpenStreetMap");
    assert_eq!(value["metadata"]["primary_attempted"], false);
    assert_eq!(value["metadata"]["data_source_status"], "fallback_to_secondary_source");
    Ok(())
}

#[tokio::test]
async fn secondary_failure_aborts_with_no_output() -> Result<()> {
    let dir = tempdir()?;
    let resolver = SourceResolver::new(Box::new(unreachable_primary()), Box::new(FailingSecondary));
    let exporter = Exporter::new(dir.path());

    let options = PipelineOptions {
        format: OutputFormat::Csv,
        limit: 0,
    };
    let err = run_with(&resolver, &exporter, &options).await.unwrap_err();
    assert!(matches!(err, FetcherError::SourceUnavailable { .. }));

    // No partial file was written for the failed run.
    assert_eq!(fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}
