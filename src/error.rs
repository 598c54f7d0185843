use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The external map-data or routing service did not answer, answered with a
    /// non-success status, or returned a payload we could not read.
    #[error("Fetch from {source_name} failed: {reason}")]
    FetchFailure { source_name: String, reason: String },

    #[error("Unknown outlet id: {0}")]
    UnknownOutlet(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CoverageError {
    pub fn fetch_failure(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        CoverageError::FetchFailure {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, CoverageError::FetchFailure { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoverageError>;
