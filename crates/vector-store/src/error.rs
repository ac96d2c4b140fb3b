use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Batch shape mismatch: {documents} documents but {embeddings} embeddings")]
    BatchMismatch { documents: usize, embeddings: usize },

    #[error("Vector store is empty; insert documents before searching")]
    EmptyStore,

    #[error("top_k must be at least 1")]
    InvalidTopK,

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
    InvalidConfig(String),

    #[error("Matrix shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl VectorStoreError {
    /// Both per-vector and per-batch shape violations count as a dimension mismatch.
    #[must_use]
    pub const fn is_dimension_mismatch(&self) -> bool {
        matches!(
            self,
            Self::InvalidDimension { .. } | Self::BatchMismatch { .. }
        )
    }

    pub(crate) fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            message: message.into(),
        }
    }
}
