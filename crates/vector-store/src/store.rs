use crate::error::{Result, VectorStoreError};
use crate::types::SearchHit;
use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Added to every L2 norm so all-zero vectors normalize to zero instead of NaN.
const NORM_EPSILON: f32 = 1e-10;

/// Append-only in-memory document store with brute-force cosine search.
///
/// Documents are identified by their insertion position. Embeddings live in a
/// single row-major matrix whose row `i` belongs to document `i`; the column
/// count is fixed by the first non-empty insertion.
#[derive(Debug, Default)]
pub struct VectorStore {
    documents: Vec<String>,
    embeddings: Option<Array2<f32>>,
}

impl VectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of documents with their embeddings.
    ///
    /// The whole batch is validated before anything is stored, so a failed
    /// insert leaves the store untouched.
    pub fn insert(&mut self, documents: Vec<String>, embeddings: &[Vec<f32>]) -> Result<()> {
        if documents.len() != embeddings.len() {
            return Err(VectorStoreError::BatchMismatch {
                documents: documents.len(),
                embeddings: embeddings.len(),
            });
        }
        let Some(first) = embeddings.first() else {
            return Ok(());
        };

        let dimension = self.dimension().unwrap_or(first.len());
        if dimension == 0 {
            return Err(VectorStoreError::EmbeddingError(
                "embeddings must have at least one component".to_string(),
            ));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
            return Err(VectorStoreError::InvalidDimension {
                expected: dimension,
                actual: bad.len(),
            });
        }

        // A NaN score would outrank every real one under `total_cmp`.
        if let Some(row) = embeddings.iter().position(|e| !all_finite(e)) {
            return Err(VectorStoreError::EmbeddingError(format!(
                "embedding {row} of the batch has a NaN or infinite component"
            )));
        }

        let flat: Vec<f32> = embeddings.iter().flatten().copied().collect();
        let batch = Array2::from_shape_vec((embeddings.len(), dimension), flat)?;
        match self.embeddings.as_mut() {
            Some(matrix) => matrix.append(Axis(0), batch.view())?,
            None => self.embeddings = Some(batch),
        }

        log::info!("Upserting {} docs", documents.len());
        self.documents.extend(documents);
        log::info!("Total docs: {}", self.documents.len());
        Ok(())
    }

    /// Return the `top_k` most similar documents, best first.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<String>> {
        Ok(self
            .search_scored(query, top_k)?
            .into_iter()
            .map(|hit| hit.document)
            .collect())
    }

    /// Like [`VectorStore::search`], but keeps positions and cosine scores.
    ///
    /// Equal scores keep insertion order.
    pub fn search_scored(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        if top_k == 0 {
            return Err(VectorStoreError::InvalidTopK);
        }
        let matrix = self
            .embeddings
            .as_ref()
            .ok_or(VectorStoreError::EmptyStore)?;
        if query.len() != matrix.ncols() {
            return Err(VectorStoreError::InvalidDimension {
                expected: matrix.ncols(),
                actual: query.len(),
            });
        }

        if !all_finite(query) {
            return Err(VectorStoreError::EmbeddingError(
                "query embedding has a NaN or infinite component".to_string(),
            ));
        }

        log::debug!("Searching {} docs for top {top_k}", self.documents.len());

        let query = unit(ArrayView1::from(query));
        let norms = matrix.map_axis(Axis(1), |row| row.dot(&row).sqrt() + NORM_EPSILON);
        let rows = matrix / &norms.insert_axis(Axis(1));
        let scores = rows.dot(&query);

        let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
        // `sort_by` is stable, which keeps ties in insertion order.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top_k);

        log::debug!("Found {} docs", ranked.len());
        Ok(ranked
            .into_iter()
            .map(|(position, score)| SearchHit {
                position: position as u64,
                document: self.documents[position].clone(),
                score,
            })
            .collect())
    }

    /// Embedding dimension, or `None` while the store is empty.
    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.embeddings.as_ref().map(Array2::ncols)
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&str> {
        self.documents.get(position).map(String::as_str)
    }

    #[must_use]
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn unit(vector: ArrayView1<'_, f32>) -> Array1<f32> {
    let norm = vector.dot(&vector).sqrt() + NORM_EPSILON;
    vector.mapv(|v| v / norm)
}

fn all_finite(vector: &[f32]) -> bool {
    vector.iter().all(|v| v.is_finite())
}
