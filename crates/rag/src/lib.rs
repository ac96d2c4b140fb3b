//! # QuickRAG
//!
//! Retrieval-augmented generation over a fixed document set.
//!
//! ## Flow
//!
//! ```text
//! index:   documents ──> Embedder (batched) ──> DocumentIndex::upsert
//!
//! answer:  query ──> Embedder ──> DocumentIndex::search (top_k)
//!                                      │
//!                                      └──> prompt ──> Generator ──> reply
//! ```
//!
//! The index is either the in-memory [`VectorStore`](quickrag_vector_store::VectorStore)
//! or a hosted Qdrant collection, picked by [`RagConfig::store`]. Generation goes
//! through Groq's OpenAI-compatible API.
//!
//! ## Example
//!
//! ```
//! use quickrag::{Pipeline, RagConfig};
//! use quickrag_vector_store::EmbeddingMode;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> quickrag::Result<()> {
//! let mut config = RagConfig::default();
//! config.embedding.mode = EmbeddingMode::Stub;
//!
//! let mut pipeline = Pipeline::from_config(&config).await?;
//! pipeline
//!     .index(vec!["Refunds take five days".into(), "Shipping is free".into()], 64)
//!     .await?;
//!
//! let hits = pipeline.retrieve("Shipping is free", 1).await?;
//! assert_eq!(hits, vec!["Shipping is free"]);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod generator;
mod pipeline;
mod prompt;

pub use config::{GroqConfig, RagConfig, RetrievalConfig, StoreBackend};
pub use error::{RagError, Result};
pub use generator::{Generator, GroqGenerator};
pub use pipeline::{open_index, Pipeline};
pub use prompt::build_prompt;
