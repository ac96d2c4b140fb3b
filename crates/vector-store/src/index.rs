use crate::error::Result;
use crate::store::VectorStore;
use crate::types::SearchHit;
use async_trait::async_trait;

/// A place documents and their embeddings can be written to and searched.
///
/// Implemented by the in-memory [`VectorStore`] and by the Qdrant-backed
/// [`crate::QdrantIndex`]; the pipeline only ever talks to this trait.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;

    /// Append documents; `embeddings[i]` belongs to `documents[i]`.
    async fn upsert(&mut self, documents: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<()>;

    async fn search_scored(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>>;

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<String>> {
        Ok(self
            .search_scored(query, top_k)
            .await?
            .into_iter()
            .map(|hit| hit.document)
            .collect())
    }
}

#[async_trait]
impl DocumentIndex for VectorStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn upsert(&mut self, documents: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        self.insert(documents, &embeddings)
    }

    async fn search_scored(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        Self::search_scored(self, query, top_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_memory_store_through_trait_object() {
        let mut index: Box<dyn DocumentIndex> = Box::new(VectorStore::new());
        assert_eq!(index.backend(), "memory");

        index
            .upsert(
                vec!["cat".into(), "dog".into(), "car".into()],
                vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.9, 0.1]],
            )
            .await
            .unwrap();

        let results = index.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results, vec!["cat".to_string(), "car".to_string()]);
    }
}
