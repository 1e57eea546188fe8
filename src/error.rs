use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetcherError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No school data available from any source: {message}")]
    SourceUnavailable { message: String },

    #[error("Invalid response format from OpenStreetMap: {snippet}")]
    InvalidResponseFormat { snippet: String },

    #[error("Export failed for '{path}': {source}")]
    ExportIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, FetcherError>;
