use crate::config::{RagConfig, StoreBackend};
use crate::error::{RagError, Result};
use crate::generator::Generator;
use crate::prompt::build_prompt;
use quickrag_vector_store::{
    build_embedder, DocumentIndex, Embedder, QdrantIndex, SearchHit, VectorStore,
};
use std::sync::Arc;

/// Open the index selected by `config.store`.
///
/// The Qdrant backend connects (and creates its collection) right away.
pub async fn open_index(config: &RagConfig) -> Result<Box<dyn DocumentIndex>> {
    match config.store {
        StoreBackend::Memory => Ok(Box::new(VectorStore::new())),
        StoreBackend::Qdrant => Ok(Box::new(QdrantIndex::connect(&config.qdrant).await?)),
    }
}

/// Embedder → index → generator.
///
/// Every step of an operation is awaited before the next one starts; a
/// failure anywhere aborts the call and is returned as is.
pub struct Pipeline {
    embedder: Arc<dyn Embedder>,
    index: Box<dyn DocumentIndex>,
    generator: Option<Box<dyn Generator>>,
}

impl Pipeline {
    pub fn new(embedder: Arc<dyn Embedder>, index: Box<dyn DocumentIndex>) -> Self {
        Self {
            embedder,
            index,
            generator: None,
        }
    }

    #[must_use]
    pub fn with_generator(mut self, generator: Box<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the embedder and index described by `config`
    pub async fn from_config(config: &RagConfig) -> Result<Self> {
        config.validate()?;
        let embedder = build_embedder(&config.embedding)?;
        let index = open_index(config).await?;
        log::info!(
            "Pipeline ready: {} embeddings, {} store",
            config.embedding.mode.as_str(),
            index.backend()
        );
        Ok(Self::new(embedder, index))
    }

    #[must_use]
    pub fn backend(&self) -> &'static str {
        self.index.backend()
    }

    /// Embed and store `documents` in batches of at most `batch_size`
    pub async fn index(&mut self, documents: Vec<String>, batch_size: usize) -> Result<()> {
        self.index_with_progress(documents, batch_size, |_, _| {})
            .await
    }

    /// Like [`Pipeline::index`], calling `on_batch(done, total)` after each batch
    pub async fn index_with_progress<F>(
        &mut self,
        documents: Vec<String>,
        batch_size: usize,
        mut on_batch: F,
    ) -> Result<()>
    where
        F: FnMut(usize, usize) + Send,
    {
        if batch_size == 0 {
            return Err(RagError::InvalidBatchSize);
        }

        let total = documents.len();
        let mut done = 0;
        let mut remaining = documents.into_iter();
        loop {
            let batch: Vec<String> = remaining.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }
            let embeddings = self.embedder.embed(&batch).await?;
            done += batch.len();
            self.index.upsert(batch, embeddings).await?;
            on_batch(done, total);
        }

        log::info!("Indexed {total} documents into the {} store", self.backend());
        Ok(())
    }

    /// Top-`top_k` documents for `query`, best first
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        let hits = self.retrieve_scored(query, top_k).await?;
        Ok(hits.into_iter().map(|hit| hit.document).collect())
    }

    /// Like [`Pipeline::retrieve`], keeping positions and scores
    pub async fn retrieve_scored(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let embedding = self.embedder.embed_one(query).await?;
        let hits = self.index.search_scored(&embedding, top_k).await?;
        log::debug!("Retrieved {} documents for query", hits.len());
        Ok(hits)
    }

    /// Retrieve context for `query` and return the generator's reply unmodified
    pub async fn answer(&self, query: &str, top_k: usize) -> Result<String> {
        let generator = self.generator.as_ref().ok_or(RagError::NoGenerator)?;
        let documents = self.retrieve(query, top_k).await?;
        let prompt = build_prompt(&documents, query);
        generator.generate(&prompt).await
    }
}
