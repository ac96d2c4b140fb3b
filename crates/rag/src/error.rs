use quickrag_ingest::IngestError;
use quickrag_vector_store::VectorStoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error(transparent)]
    Store(#[from] VectorStoreError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("Missing credential for {service}: set {variable}")]
    MissingCredential {
        service: &'static str,
        variable: &'static str,
    },

    #[error("{service} request failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("batch_size must be at least 1")]
    InvalidBatchSize,

    #[error("No generator configured; answering needs a Groq API key")]
    NoGenerator,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RagError {
    pub(crate) fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            message: message.into(),
        }
    }

    /// Dimension problems raised by either store backend.
    #[must_use]
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_dimension_mismatch())
    }
}
