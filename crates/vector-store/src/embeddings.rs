use crate::error::{Result, VectorStoreError};
use async_trait::async_trait;
use ndarray::{Array1, Array2, ArrayD, ArrayView1, ArrayView2, Ix2, Ix3};
use ort::session::{builder::GraphOptimizationLevel, Session, SessionInputs};
use ort::value::{DynTensor, Tensor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokenizers::utils::parallelism;
use tokenizers::{Encoding, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tokio::task::spawn_blocking;

/// Maps a batch of texts to fixed-dimension vectors, same length and order.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| VectorStoreError::EmbeddingError("Empty embedding result".to_string()))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingMode {
    /// Sentence-transformers model running on ONNX Runtime.
    #[default]
    Onnx,
    /// Deterministic hash-seeded vectors; no model files needed.
    Stub,
}

impl EmbeddingMode {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "onnx" | "fast" => Ok(Self::Onnx),
            "stub" => Ok(Self::Stub),
            other => Err(VectorStoreError::EmbeddingError(format!(
                "Unsupported embedding mode '{other}' (expected 'onnx' or 'stub')"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Onnx => "onnx",
            Self::Stub => "stub",
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub mode: EmbeddingMode,

    /// Model id; also the sub-directory of `model_dir` holding the assets
    pub model_id: String,

    /// Directory containing `<model_id>/model.onnx` and `<model_id>/tokenizer.json`
    pub model_dir: PathBuf,

    /// Output dimension of the model
    pub dimension: usize,

    /// Tokens per input after truncation
    pub max_length: usize,

    /// Inputs per ONNX forward pass
    pub max_batch: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            mode: EmbeddingMode::Onnx,
            model_id: "all-MiniLM-L6-v2".to_string(),
            model_dir: PathBuf::from("models"),
            dimension: 384,
            max_length: 256,
            max_batch: 64,
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.dimension == 0 {
            return Err("embedding.dimension must be > 0".to_string());
        }
        if self.max_length == 0 {
            return Err("embedding.max_length must be > 0".to_string());
        }
        if self.max_batch == 0 {
            return Err("embedding.max_batch must be > 0".to_string());
        }
        Ok(())
    }
}

/// Build the embedder selected by `config.mode`.
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.mode {
        EmbeddingMode::Stub => Ok(Arc::new(StubEmbedder::new(config.dimension))),
        EmbeddingMode::Onnx => Ok(Arc::new(OnnxEmbedder::new(config)?)),
    }
}

/// Deterministic embedder for tests and offline runs.
///
/// Each text is hashed into a seed for a pseudo-random unit vector, so equal
/// texts always embed identically and different texts are nearly orthogonal.
#[derive(Clone, Debug)]
pub struct StubEmbedder {
    dimension: usize,
}

impl StubEmbedder {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| stub_embed(text, self.dimension))
            .collect())
    }
}

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

fn stub_embed(text: &str, dimension: usize) -> Vec<f32> {
    let seed = text_seed(text);
    let components = (0..dimension as u64)
        .map(|i| {
            let bits = fmix64(seed ^ (i + 1).wrapping_mul(GOLDEN_GAMMA));
            // top 24 bits mapped onto [-1, 1)
            (bits >> 40) as f32 / (1u64 << 23) as f32 - 1.0
        })
        .collect();
    unit_vector(components)
}

/// FNV-1a over the UTF-8 bytes
fn text_seed(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x100_0000_01b3)
    })
}

/// MurmurHash3 finalizer
const fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^ (k >> 33)
}

fn unit_vector(mut vec: Vec<f32>) -> Vec<f32> {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vec.iter_mut().for_each(|v| *v /= norm);
    }
    vec
}

fn embedding_error(context: &str, err: impl std::fmt::Display) -> VectorStoreError {
    VectorStoreError::EmbeddingError(format!("{context}: {err}"))
}

/// Sentence-transformers model exported to ONNX, run on ONNX Runtime.
///
/// Expects `<model_dir>/<model_id>/model.onnx` and `tokenizer.json` next to it.
/// Inference runs on tokio's blocking pool.
pub struct OnnxEmbedder {
    model: Arc<OnnxModel>,
}

impl OnnxEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        config.validate().map_err(VectorStoreError::InvalidConfig)?;
        Ok(Self {
            model: Arc::new(OnnxModel::load(config)?),
        })
    }
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    fn dimension(&self) -> usize {
        self.model.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        log::debug!("Embedding {} texts", texts.len());
        let owned = texts.to_vec();
        let model = Arc::clone(&self.model);
        spawn_blocking(move || model.embed_blocking(&owned))
            .await
            .map_err(|e| embedding_error("Embedding task failed", e))?
    }
}

struct OnnxModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    max_batch: usize,
    dimension: usize,
}

impl OnnxModel {
    fn load(config: &EmbeddingConfig) -> Result<Self> {
        let dir = config.model_dir.join(&config.model_id);
        let onnx_path = dir.join("model.onnx");
        let tokenizer_path = dir.join("tokenizer.json");
        for path in [&onnx_path, &tokenizer_path] {
            if !path.is_file() {
                return Err(VectorStoreError::EmbeddingError(format!(
                    "Missing {} for model '{}' (set QUICKRAG_MODEL_DIR or use --embed-mode stub)",
                    path.display(),
                    config.model_id,
                )));
            }
        }

        // Tokenization already runs off the async runtime; no extra rayon pool.
        if !parallelism::is_parallelism_configured() {
            parallelism::set_parallelism(false);
        }

        let tokenizer = load_tokenizer(&tokenizer_path, config.max_length)?;
        let session = load_session(&onnx_path)?;
        log::info!(
            "Loaded ONNX model '{}' from {} (dim {})",
            config.model_id,
            dir.display(),
            config.dimension
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            max_batch: config.max_batch,
            dimension: config.dimension,
        })
    }

    fn embed_blocking(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.max_batch) {
            let encodings = self
                .tokenizer
                .encode_batch(chunk.to_vec(), true)
                .map_err(|e| embedding_error("Tokenization failed", e))?;
            let inputs = BatchInputs::from_encodings(&encodings)?;
            let output = self.forward(&inputs)?;
            embeddings.extend(pool_output(output, &inputs.attention_mask, self.dimension)?);
        }
        Ok(embeddings)
    }

    fn forward(&self, inputs: &BatchInputs) -> Result<ArrayD<f32>> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| VectorStoreError::EmbeddingError("ONNX session lock poisoned".into()))?;

        let mut feed: HashMap<String, DynTensor> = HashMap::new();
        for input in &session.inputs {
            let array = inputs.get(&input.name).ok_or_else(|| {
                VectorStoreError::EmbeddingError(format!(
                    "Model expects unsupported input '{}'",
                    input.name
                ))
            })?;
            let tensor = Tensor::from_array(array.clone().into_dyn())
                .map_err(|e| embedding_error(&input.name, e))?;
            feed.insert(input.name.clone(), tensor.upcast());
        }

        let outputs = session
            .run(SessionInputs::from(feed))
            .map_err(|e| embedding_error("ONNX forward pass failed", e))?;
        if outputs.len() == 0 {
            return Err(VectorStoreError::EmbeddingError(
                "ONNX model produced no outputs".to_string(),
            ));
        }
        let hidden = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| embedding_error("Cannot read ONNX output", e))?
            .to_owned();

        drop(outputs);
        drop(session);
        Ok(hidden)
    }
}

fn load_tokenizer(path: &Path, max_length: usize) -> Result<Tokenizer> {
    let mut tokenizer =
        Tokenizer::from_file(path).map_err(|e| embedding_error("Cannot read tokenizer", e))?;
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::BatchLongest,
        ..PaddingParams::default()
    }));
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..TruncationParams::default()
        }))
        .map_err(|e| embedding_error("Cannot configure truncation", e))?;
    Ok(tokenizer)
}

fn load_session(model_path: &Path) -> Result<Session> {
    let threads = std::thread::available_parallelism()
        .map(|n| n.get().min(4))
        .unwrap_or(1);
    Session::builder()
        .map_err(|e| embedding_error("Cannot create ONNX session builder", e))?
        .with_intra_threads(threads)
        .map_err(|e| embedding_error("Cannot set ONNX intra-op threads", e))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| embedding_error("Cannot set ONNX optimization level", e))?
        .commit_from_file(model_path)
        .map_err(|e| embedding_error("Cannot load ONNX model", e))
}

/// Token tensors for one batch, each shaped `[batch, seq_len]`
struct BatchInputs {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    token_type_ids: Array2<i64>,
}

impl BatchInputs {
    fn from_encodings(encodings: &[Encoding]) -> Result<Self> {
        let seq_len = encodings.first().map_or(0, Encoding::len);
        if encodings.iter().any(|e| e.len() != seq_len) {
            return Err(VectorStoreError::EmbeddingError(
                "Encodings differ in length after padding".to_string(),
            ));
        }

        let shape = (encodings.len(), seq_len);
        let column = |pick: fn(&Encoding) -> &[u32]| {
            Array2::from_shape_fn(shape, |(row, col)| i64::from(pick(&encodings[row])[col]))
        };
        Ok(Self {
            input_ids: column(Encoding::get_ids),
            attention_mask: column(Encoding::get_attention_mask),
            token_type_ids: column(Encoding::get_type_ids),
        })
    }

    fn get(&self, name: &str) -> Option<&Array2<i64>> {
        match name {
            "input_ids" => Some(&self.input_ids),
            "attention_mask" => Some(&self.attention_mask),
            "token_type_ids" => Some(&self.token_type_ids),
            _ => None,
        }
    }
}

/// One unit vector per input row.
///
/// `[batch, dim]` outputs are already pooled; `[batch, seq, dim]` token states
/// are mean-pooled over the attention mask.
fn pool_output(
    output: ArrayD<f32>,
    attention_mask: &Array2<i64>,
    dimension: usize,
) -> Result<Vec<Vec<f32>>> {
    let pooled: Array2<f32> = match output.ndim() {
        2 => output.into_dimensionality::<Ix2>()?,
        3 => {
            let tokens = output.into_dimensionality::<Ix3>()?;
            let (batch, seq_len, hidden) = tokens.dim();
            if attention_mask.dim() != (batch, seq_len) {
                return Err(VectorStoreError::EmbeddingError(format!(
                    "Token states {:?} do not match attention mask {:?}",
                    tokens.shape(),
                    attention_mask.shape()
                )));
            }
            let mut pooled = Array2::zeros((batch, hidden));
            for ((states, mask), mut row) in tokens
                .outer_iter()
                .zip(attention_mask.outer_iter())
                .zip(pooled.outer_iter_mut())
            {
                row.assign(&mean_pool(states, mask));
            }
            pooled
        }
        _ => {
            return Err(VectorStoreError::EmbeddingError(format!(
                "Unexpected ONNX output shape {:?}",
                output.shape()
            )));
        }
    };

    if pooled.ncols() != dimension {
        return Err(VectorStoreError::InvalidDimension {
            expected: dimension,
            actual: pooled.ncols(),
        });
    }
    Ok(pooled
        .outer_iter()
        .map(|row| unit_vector(row.to_vec()))
        .collect())
}

/// Average of the token states whose mask entry is set
fn mean_pool(states: ArrayView2<'_, f32>, mask: ArrayView1<'_, i64>) -> Array1<f32> {
    let weights = mask.mapv(|m| if m == 0 { 0.0f32 } else { 1.0 });
    let count = weights.sum();
    let summed = states.t().dot(&weights);
    if count > 0.0 {
        summed / count
    } else {
        summed
    }
}
