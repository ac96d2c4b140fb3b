//! # QuickRAG Vector Store
//!
//! Embedding and nearest-neighbour retrieval for the QuickRAG pipeline.
//!
//! ## Features
//!
//! - **Brute-force cosine search** over an append-only in-memory matrix
//! - **Qdrant backend** speaking the REST API for hosted deployments
//! - **ONNX embeddings** (sentence-transformers via ONNX Runtime)
//! - **Stub embeddings** for tests and offline runs
//!
//! ## Architecture
//!
//! ```text
//! texts
//!     │
//!     ├──> Embedder (ONNX / stub)
//!     │      └─> Vec<f32>[384]
//!     │
//!     └──> DocumentIndex
//!            ├─> VectorStore (in-memory, exact)
//!            └─> QdrantIndex (remote collection)
//! ```
//!
//! ## Example
//!
//! ```
//! use quickrag_vector_store::VectorStore;
//!
//! let mut store = VectorStore::new();
//! store
//!     .insert(
//!         vec!["cat".into(), "dog".into(), "car".into()],
//!         &[vec![1.0, 0.0], vec![0.0, 1.0], vec![0.9, 0.1]],
//!     )
//!     .unwrap();
//!
//! let results = store.search(&[1.0, 0.0], 2).unwrap();
//! assert_eq!(results, vec!["cat", "car"]);
//! ```

mod embeddings;
mod error;
mod index;
mod qdrant;
mod store;
mod types;

pub use embeddings::{
    build_embedder, Embedder, EmbeddingConfig, EmbeddingMode, OnnxEmbedder, StubEmbedder,
};
pub use error::{Result, VectorStoreError};
pub use index::DocumentIndex;
pub use qdrant::{QdrantConfig, QdrantIndex};
pub use store::VectorStore;
pub use types::SearchHit;
