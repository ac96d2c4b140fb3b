//! # QuickRAG Ingest
//!
//! Turns tabular knowledge-base exports into plain document strings for
//! indexing.
//!
//! ## Pipeline
//!
//! ```text
//! FAQ JSON export
//!     │
//!     ├──> split_faq_json → question / answer records (JSON + CSV)
//!     │
//! CSV file
//!     │
//!     ├──> TextColumns::detect (text | title+content | content | question+answer)
//!     │
//!     └──> Chunker → fixed-width character windows for long rows
//! ```
//!
//! ## Example
//!
//! ```rust
//! use quickrag_ingest::{read_csv_documents, Chunker, ChunkingConfig};
//!
//! let csv = "question,answer\nWhat is RAG?,Retrieval-augmented generation\n";
//! let docs = read_csv_documents(csv.as_bytes(), None).unwrap();
//!
//! let chunker = Chunker::new(ChunkingConfig::default()).unwrap();
//! let chunks = chunker.chunk_all(docs);
//! assert_eq!(chunks, vec!["What is RAG?\n\nRetrieval-augmented generation"]);
//! ```

mod chunker;
mod config;
mod error;
pub mod faq;
mod table;

pub use chunker::{chunk_text, Chunker};
pub use config::ChunkingConfig;
pub use error::{IngestError, Result};
pub use table::{load_csv_documents, read_csv_documents, TextColumns};
