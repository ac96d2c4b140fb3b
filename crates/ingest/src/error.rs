use thiserror::Error;

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors that can occur while loading and preparing documents
#[derive(Error, Debug)]
pub enum IngestError {
    /// No column (or column pair) that can be flattened into document text
    #[error(
        "No suitable text column found (tried, in order: 'text', 'title'+'content', 'content', 'question'+'answer'); columns: {columns:?}"
    )]
    NoTextColumn { columns: Vec<String> },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// CSV read or write failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON read or write failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
