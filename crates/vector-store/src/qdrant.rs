use crate::error::{Result, VectorStoreError};
use crate::index::DocumentIndex;
use crate::types::SearchHit;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const SERVICE: &str = "Qdrant";

/// Connection and collection settings for a Qdrant deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    /// Cluster URL, e.g. `https://xyz.cloud.qdrant.io:6333`
    pub url: Option<String>,

    pub api_key: Option<String>,

    pub collection: String,

    /// Vector size the collection is created with
    pub vector_size: usize,

    /// Points per upsert request
    pub upsert_batch_size: usize,

    /// Drop and recreate the collection on connect
    pub recreate: bool,

    pub timeout_secs: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            collection: "quickrag_collection".to_string(),
            vector_size: 384,
            upsert_batch_size: 64,
            recreate: false,
            timeout_secs: 30,
        }
    }
}

impl QdrantConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.collection.trim().is_empty() {
            return Err("qdrant.collection must not be empty".to_string());
        }
        if self.vector_size == 0 {
            return Err("qdrant.vector_size must be > 0".to_string());
        }
        if self.upsert_batch_size == 0 {
            return Err("qdrant.upsert_batch_size must be > 0".to_string());
        }
        Ok(())
    }
}

/// Collection in a hosted Qdrant instance, addressed over the REST API.
///
/// Point ids are positional and global: they continue from the collection's
/// `points_count` at connect time, so consecutive batches never reuse an id.
pub struct QdrantIndex {
    client: Client,
    base_url: String,
    api_key: String,
    collection: String,
    vector_size: usize,
    upsert_batch_size: usize,
    next_id: u64,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    #[serde(default)]
    points_count: Option<u64>,
    #[serde(default)]
    config: Option<CollectionConfig>,
}

#[derive(Debug, Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Debug, Deserialize)]
struct CollectionParams {
    vectors: Value,
}

#[derive(Debug, Serialize)]
struct Point<'a> {
    id: u64,
    vector: &'a [f32],
    payload: Payload<'a>,
}

#[derive(Debug, Serialize)]
struct Payload<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Option<Value>,
}

impl ScoredPoint {
    /// Points written by [`QdrantIndex`] carry an integer id and a `text` payload.
    fn into_hit(self) -> Result<SearchHit> {
        let position = self.id.as_u64().ok_or_else(|| {
            VectorStoreError::upstream(SERVICE, format!("point id {} is not an integer", self.id))
        })?;
        let document = self
            .payload
            .as_ref()
            .and_then(|payload| payload.get("text"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                VectorStoreError::upstream(SERVICE, format!("point {position} has no text payload"))
            })?
            .to_string();
        Ok(SearchHit {
            position,
            document,
            score: self.score,
        })
    }
}

impl QdrantIndex {
    /// Connect and make sure the collection exists.
    ///
    /// Credentials are checked before any request is made.
    pub async fn connect(config: &QdrantConfig) -> Result<Self> {
        let base_url = config
            .url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(VectorStoreError::MissingCredential {
                service: SERVICE,
                variable: "QDRANT_URL",
            })?
            .trim_end_matches('/')
            .to_string();
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(VectorStoreError::MissingCredential {
                service: SERVICE,
                variable: "QDRANT_API_KEY",
            })?;
        config
            .validate()
            .map_err(VectorStoreError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VectorStoreError::upstream(SERVICE, e.to_string()))?;

        let mut index = Self {
            client,
            base_url,
            api_key,
            collection: config.collection.clone(),
            vector_size: config.vector_size,
            upsert_batch_size: config.upsert_batch_size,
            next_id: 0,
        };

        if config.recreate {
            index.delete_collection().await?;
        }
        match index.collection_info().await? {
            Some(info) => {
                index.check_vector_size(&info)?;
                index.next_id = info.points_count.unwrap_or(0);
            }
            None => index.create_collection().await?,
        }

        log::info!(
            "Connected to Qdrant collection '{}' ({} points)",
            index.collection,
            index.next_id
        );
        Ok(index)
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Id the next upserted point will get.
    #[must_use]
    pub const fn next_id(&self) -> u64 {
        self.next_id
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        request
            .header("api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| VectorStoreError::upstream(SERVICE, e.to_string()))
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(VectorStoreError::upstream(
            SERVICE,
            format!("HTTP {status}: {body}"),
        ))
    }

    async fn collection_info(&self) -> Result<Option<CollectionInfo>> {
        let response = self.send(self.client.get(self.collection_url())).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::expect_success(response).await?;
        let envelope: Envelope<CollectionInfo> = response
            .json()
            .await
            .map_err(|e| VectorStoreError::upstream(SERVICE, e.to_string()))?;
        Ok(Some(envelope.result))
    }

    fn check_vector_size(&self, info: &CollectionInfo) -> Result<()> {
        let size = info
            .config
            .as_ref()
            .and_then(|config| config.params.vectors.get("size"))
            .and_then(Value::as_u64);
        match size {
            Some(size) if size as usize != self.vector_size => {
                Err(VectorStoreError::InvalidDimension {
                    expected: self.vector_size,
                    actual: size as usize,
                })
            }
            _ => Ok(()),
        }
    }

    async fn create_collection(&self) -> Result<()> {
        log::info!(
            "Creating Qdrant collection '{}' (size {}, cosine)",
            self.collection,
            self.vector_size
        );
        let body = json!({
            "vectors": { "size": self.vector_size, "distance": "Cosine" }
        });
        let response = self
            .send(self.client.put(self.collection_url()).json(&body))
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn delete_collection(&self) -> Result<()> {
        log::info!("Dropping Qdrant collection '{}'", self.collection);
        let response = self.send(self.client.delete(self.collection_url())).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::expect_success(response).await?;
        Ok(())
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.vector_size {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.vector_size,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentIndex for QdrantIndex {
    fn backend(&self) -> &'static str {
        "qdrant"
    }

    async fn upsert(&mut self, documents: Vec<String>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        if documents.len() != embeddings.len() {
            return Err(VectorStoreError::BatchMismatch {
                documents: documents.len(),
                embeddings: embeddings.len(),
            });
        }
        for vector in &embeddings {
            self.check_dimension(vector)?;
        }

        let url = format!("{}/points?wait=true", self.collection_url());
        let pairs: Vec<(&String, &Vec<f32>)> = documents.iter().zip(&embeddings).collect();
        for batch in pairs.chunks(self.upsert_batch_size) {
            let points: Vec<Point<'_>> = batch
                .iter()
                .enumerate()
                .map(|(offset, (doc, vector))| Point {
                    id: self.next_id + offset as u64,
                    vector: vector.as_slice(),
                    payload: Payload { text: doc.as_str() },
                })
                .collect();

            let response = self
                .send(self.client.put(&url).json(&json!({ "points": points })))
                .await?;
            Self::expect_success(response).await?;
            self.next_id += batch.len() as u64;
        }

        log::info!(
            "Upserted {} docs into '{}' (next id {})",
            documents.len(),
            self.collection,
            self.next_id
        );
        Ok(())
    }

    async fn search_scored(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        if top_k == 0 {
            return Err(VectorStoreError::InvalidTopK);
        }
        self.check_dimension(query)?;

        let body = json!({
            "vector": query,
            "limit": top_k,
            "with_payload": true,
        });
        let url = format!("{}/points/search", self.collection_url());
        let response = self.send(self.client.post(url).json(&body)).await?;
        let response = Self::expect_success(response).await?;
        let envelope: Envelope<Vec<ScoredPoint>> = response
            .json()
            .await
            .map_err(|e| VectorStoreError::upstream(SERVICE, e.to_string()))?;

        let hits = envelope
            .result
            .into_iter()
            .map(ScoredPoint::into_hit)
            .collect::<Result<Vec<_>>>()?;
        log::debug!("Qdrant returned {} hits", hits.len());
        Ok(hits)
    }
}
