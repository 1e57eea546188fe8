use crate::error::{FetcherError, Result};
use crate::model::{FetchResult, SchoolRecord, SourceKind};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::ValueEnum;
use csv::{QuoteStyle, WriterBuilder};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Export column order. Fixed and explicit: the header never depends on
/// which fields happen to be populated on the first record.
pub const CSV_COLUMNS: [&str; 25] = [
    "id",
    "name",
    "category",
    "latitude",
    "longitude",
    "city",
    "province",
    "postal_code",
    "address",
    "education_level",
    "operator",
    "operator_type",
    "website",
    "phone",
    "email",
    "capacity",
    "grades",
    "language",
    "denomination",
    "gender_policy",
    "wheelchair_access",
    "retrieved_at",
    "data_source",
    "source_native_id",
    "source_native_type",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Serialize)]
struct ExportMetadata<'a> {
    total_count: usize,
    generated_at: DateTime<Utc>,
    source_used: &'a str,
    primary_data_source: &'static str,
    secondary_data_source: &'static str,
    primary_attempted: bool,
    data_source_status: &'static str,
    country: &'static str,
}

#[derive(Serialize)]
struct JsonEnvelope<'a> {
    metadata: ExportMetadata<'a>,
    schools: &'a [SchoolRecord],
}

/// Writes a run's records to a timestamped file under the output directory.
pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Serializes the result and writes it in one shot. The filename embeds
    /// the run timestamp so successive runs never overwrite each other.
    pub fn export(&self, result: &FetchResult, format: OutputFormat) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).map_err(|e| FetcherError::ExportIo {
            path: self.output_dir.display().to_string(),
            source: e,
        })?;

        let timestamp = result.generated_at.format("%Y-%m-%d_%H-%M-%S");
        let filename = format!("dominican_schools_{}.{}", timestamp, format.extension());
        let path = self.output_dir.join(filename);

        let content = match format {
            OutputFormat::Csv => to_csv(&result.schools)?,
            OutputFormat::Json => to_json(result)?,
        };

        fs::write(&path, content).map_err(|e| FetcherError::ExportIo {
            path: path.display().to_string(),
            source: e,
        })?;

        info!("Exported {} records to {}", result.total_count, path.display());
        Ok(path)
    }
}

/// CSV with every field quoted and quotes doubled; empty string for absent
/// values. The header row is present even for an empty record set.
fn to_csv(schools: &[SchoolRecord]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(CSV_COLUMNS)?;
    for school in schools {
        writer.write_record(csv_fields(school))?;
    }

    // Flushing into a Vec cannot fail, but the API still surfaces it.
    writer
        .into_inner()
        .map_err(|e| FetcherError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))
}

/// Pretty-printed JSON envelope; serde_json leaves non-ASCII unescaped.
fn to_json(result: &FetchResult) -> Result<Vec<u8>> {
    let envelope = JsonEnvelope {
        metadata: ExportMetadata {
            total_count: result.total_count,
            generated_at: result.generated_at,
            source_used: result.source_used.name(),
            primary_data_source: SourceKind::Government.name(),
            secondary_data_source: SourceKind::OpenStreetMap.name(),
            primary_attempted: result.primary_attempted,
            data_source_status: match result.source_used {
                SourceKind::Government => "primary_source_successful",
                SourceKind::OpenStreetMap => "fallback_to_secondary_source",
            },
            country: "Dominican Republic",
        },
        schools: &result.schools,
    };
    Ok(serde_json::to_string_pretty(&envelope)?.into_bytes())
}

/// Coerces one record to the 25 column values, in `CSV_COLUMNS` order.
fn csv_fields(school: &SchoolRecord) -> [String; 25] {
    let opt = |value: &Option<String>| value.clone().unwrap_or_default();
    let coord = |value: &Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();

    [
        school.id.to_string(),
        school.name.clone(),
        school.category.clone(),
        coord(&school.latitude),
        coord(&school.longitude),
        opt(&school.city),
        opt(&school.province),
        opt(&school.postal_code),
        school.address.clone(),
        opt(&school.education_level),
        opt(&school.operator),
        opt(&school.operator_type),
        opt(&school.website),
        opt(&school.phone),
        opt(&school.email),
        opt(&school.capacity),
        opt(&school.grades),
        opt(&school.language),
        opt(&school.denomination),
        opt(&school.gender_policy),
        opt(&school.wheelchair_access),
        school.retrieved_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        school.data_source.clone(),
        school.source_native_id.to_string(),
        school.source_native_type.clone(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn record(id: i64, name: &str) -> SchoolRecord {
        SchoolRecord {
            id,
            name: name.to_string(),
            category: "school".to_string(),
            latitude: Some(18.5),
            longitude: Some(-69.9),
            city: Some("Santo Domingo".to_string()),
            province: None,
            postal_code: None,
            address: "Calle 1, 23".to_string(),
            education_level: None,
            operator: None,
            operator_type: None,
            website: None,
            phone: None,
            email: None,
            capacity: None,
            grades: None,
            language: None,
            denomination: None,
            gender_policy: None,
            wheelchair_access: None,
            retrieved_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            data_source: "OpenStreetMap".to_string(),
            source_native_id: id,
            source_native_type: "node".to_string(),
        }
    }

    fn result_with(schools: Vec<SchoolRecord>) -> FetchResult {
        FetchResult {
            total_count: schools.len(),
            schools,
            source_used: SourceKind::OpenStreetMap,
            primary_attempted: true,
            generated_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn empty_export_is_header_only() {
        let dir = tempdir().unwrap();
        let path = Exporter::new(dir.path())
            .export(&result_with(Vec::new()), OutputFormat::Csv)
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("\"id\",\"name\",\"category\""));
        assert_eq!(lines[0].matches(',').count(), 24);
    }

    #[test]
    fn csv_round_trips_all_columns() {
        let dir = tempdir().unwrap();
        let mut special = record(2, "Colegio \"San José\"");
        special.latitude = None;
        special.longitude = None;

        let path = Exporter::new(dir.path())
            .export(&result_with(vec![record(1, "Colegio Niños del Sol"), special]), OutputFormat::Csv)
            .unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(
            reader.headers().unwrap().iter().collect::<Vec<_>>(),
            CSV_COLUMNS.to_vec()
        );

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "Colegio Niños del Sol");
        assert_eq!(&rows[0][3], "18.5");
        assert_eq!(&rows[0][8], "Calle 1, 23");
        assert_eq!(&rows[1][1], "Colegio \"San José\"");
        assert_eq!(&rows[1][3], "");
        assert_eq!(&rows[1][4], "");
        assert_eq!(&rows[1][21], "2025-06-01T12:00:00Z");
        assert_eq!(&rows[1][24], "node");
    }

    #[test]
    fn json_envelope_carries_metadata_and_schools() {
        let dir = tempdir().unwrap();
        let path = Exporter::new(dir.path())
            .export(&result_with(vec![record(1, "Colegio X")]), OutputFormat::Json)
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(value["metadata"]["total_count"], 1);
        assert_eq!(value["metadata"]["source_used"], "OpenStreetMap");
        assert_eq!(value["metadata"]["data_source_status"], "fallback_to_secondary_source");
        assert_eq!(value["metadata"]["country"], "Dominican Republic");
        assert_eq!(value["schools"][0]["name"], "Colegio X");
        assert_eq!(value["schools"][0]["latitude"], 18.5);
    }

    #[test]
    fn empty_json_export_has_zero_count_and_empty_array() {
        let dir = tempdir().unwrap();
        let path = Exporter::new(dir.path())
            .export(&result_with(Vec::new()), OutputFormat::Json)
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["metadata"]["total_count"], 0);
        assert_eq!(value["schools"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn non_ascii_is_preserved_unescaped() {
        let dir = tempdir().unwrap();
        let path = Exporter::new(dir.path())
            .export(&result_with(vec![record(1, "Escuela Añil")]), OutputFormat::Json)
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Escuela Añil"));
        assert!(!content.contains("\\u00f1"));
    }

    #[test]
    fn filename_embeds_run_timestamp() {
        let dir = tempdir().unwrap();
        let path = Exporter::new(dir.path())
            .export(&result_with(Vec::new()), OutputFormat::Csv)
            .unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name, "dominican_schools_2025-06-01_12-00-00.csv");
    }

    #[test]
    fn unwritable_destination_is_export_io() {
        let dir = tempdir().unwrap();
        // A file where the output directory should be.
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, b"").unwrap();

        let err = Exporter::new(&blocker)
            .export(&result_with(Vec::new()), OutputFormat::Csv)
            .unwrap_err();
        assert!(matches!(err, FetcherError::ExportIo { .. }));
    }
}
