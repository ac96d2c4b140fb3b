use crate::error::{RagError, Result};
use quickrag_ingest::ChunkingConfig;
use quickrag_vector_store::{EmbeddingConfig, EmbeddingMode, QdrantConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which [`DocumentIndex`](quickrag_vector_store::DocumentIndex) backs the pipeline
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process brute-force store; contents vanish with the process
    #[default]
    Memory,
    /// Hosted Qdrant collection
    Qdrant,
}

impl StoreBackend {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory" | "local" => Ok(Self::Memory),
            "qdrant" => Ok(Self::Qdrant),
            other => Err(RagError::Config(format!(
                "Unsupported store '{other}' (expected 'memory' or 'qdrant')"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Qdrant => "qdrant",
        }
    }
}

/// Groq chat-completions settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroqConfig {
    pub api_key: Option<String>,

    pub model: String,

    /// OpenAI-compatible API root; `/chat/completions` is appended
    pub base_url: String,

    pub system_prompt: String,

    pub timeout_secs: u64,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "llama-3.1-8b-instant".to_string(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            system_prompt: "You are a helpful assistant.".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Documents passed to the prompt
    pub top_k: usize,

    /// Documents embedded per call while indexing
    pub batch_size: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            batch_size: 64,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub embedding: EmbeddingConfig,
    pub qdrant: QdrantConfig,
    pub groq: GroqConfig,
    pub retrieval: RetrievalConfig,
    pub chunking: ChunkingConfig,
    pub store: StoreBackend,
}

impl RagConfig {
    /// Parse a TOML document; absent sections keep their defaults
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Defaults, then the optional TOML file, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.warn_missing_credentials();
        Ok(config)
    }

    /// Overlay environment variables read through `lookup`.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("QDRANT_URL") {
            self.qdrant.url = Some(url);
        }
        if let Some(key) = get("QDRANT_API_KEY") {
            self.qdrant.api_key = Some(key);
        }
        if let Some(collection) = get("QDRANT_COLLECTION") {
            self.qdrant.collection = collection;
        }
        if let Some(key) = get("GROQ_API_KEY") {
            self.groq.api_key = Some(key);
        }
        if let Some(model) = get("GROQ_MODEL") {
            self.groq.model = model;
        }
        if let Some(mode) = get("QUICKRAG_EMBEDDING_MODE") {
            self.embedding.mode = EmbeddingMode::parse(&mode)?;
        }
        if let Some(dir) = get("QUICKRAG_MODEL_DIR") {
            self.embedding.model_dir = PathBuf::from(dir);
        }
        if let Some(store) = get("QUICKRAG_STORE") {
            self.store = StoreBackend::parse(&store)?;
        }
        Ok(())
    }

    /// Log credentials the selected setup will need but does not have
    pub fn warn_missing_credentials(&self) {
        if self.store == StoreBackend::Qdrant {
            if self.qdrant.url.is_none() {
                log::warn!("QDRANT_URL is not set; the Qdrant store cannot connect");
            }
            if self.qdrant.api_key.is_none() {
                log::warn!("QDRANT_API_KEY is not set; the Qdrant store cannot connect");
            }
        }
        if self.groq.api_key.is_none() {
            log::warn!("GROQ_API_KEY is not set; answer generation is unavailable");
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.embedding.validate().map_err(RagError::Config)?;
        self.chunking.validate().map_err(RagError::Config)?;
        if self.retrieval.top_k == 0 {
            return Err(RagError::Config("retrieval.top_k must be > 0".to_string()));
        }
        if self.retrieval.batch_size == 0 {
            return Err(RagError::Config(
                "retrieval.batch_size must be > 0".to_string(),
            ));
        }
        if self.store == StoreBackend::Qdrant {
            self.qdrant.validate().map_err(RagError::Config)?;
            if self.qdrant.vector_size != self.embedding.dimension {
                return Err(RagError::Config(format!(
                    "qdrant.vector_size ({}) must equal embedding.dimension ({})",
                    self.qdrant.vector_size, self.embedding.dimension
                )));
            }
        }
        if self.groq.model.trim().is_empty() {
            return Err(RagError::Config("groq.model must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.batch_size, 64);
        assert_eq!(config.groq.model, "llama-3.1-8b-instant");
        assert_eq!(config.qdrant.collection, "quickrag_collection");
        assert_eq!(config.embedding.dimension, 384);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_sections_are_optional() {
        let config = RagConfig::from_toml_str(
            r#"
            store = "qdrant"

            [retrieval]
            top_k = 3

            [qdrant]
            collection = "faq"
            "#,
        )
        .unwrap();
        assert_eq!(config.store, StoreBackend::Qdrant);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.batch_size, 64);
        assert_eq!(config.qdrant.collection, "faq");
        assert_eq!(config.qdrant.upsert_batch_size, 64);
        assert_eq!(config.chunking, ChunkingConfig::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = RagConfig::from_toml_str("[qdrant]\ncollection = \"file\"\n").unwrap();
        config
            .apply_env(env(&[
                ("QDRANT_COLLECTION", "env"),
                ("QDRANT_URL", "http://localhost:6333"),
                ("GROQ_API_KEY", "gsk"),
                ("GROQ_MODEL", ""),
                ("QUICKRAG_EMBEDDING_MODE", "stub"),
                ("QUICKRAG_STORE", "qdrant"),
            ]))
            .unwrap();

        assert_eq!(config.qdrant.collection, "env");
        assert_eq!(config.qdrant.url.as_deref(), Some("http://localhost:6333"));
        assert_eq!(config.groq.api_key.as_deref(), Some("gsk"));
        // Empty values do not clobber the default.
        assert_eq!(config.groq.model, "llama-3.1-8b-instant");
        assert_eq!(config.embedding.mode, EmbeddingMode::Stub);
        assert_eq!(config.store, StoreBackend::Qdrant);
    }

    #[test]
    fn test_bad_env_values_are_errors() {
        let mut config = RagConfig::default();
        assert!(config.apply_env(env(&[("QUICKRAG_STORE", "sqlite")])).is_err());
        assert!(config
            .apply_env(env(&[("QUICKRAG_EMBEDDING_MODE", "gpu")]))
            .is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = RagConfig::default();
        config.retrieval.batch_size = 0;
        assert!(matches!(config.validate(), Err(RagError::Config(_))));

        let mut config = RagConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = RagConfig::default();
        config.store = StoreBackend::Qdrant;
        config.qdrant.vector_size = 768;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("768"), "{err}");
    }

    #[test]
    fn test_config_file_roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quickrag.toml");
        std::fs::write(&path, "[chunking]\nthreshold_chars = 50\nwindow_chars = 40\n").unwrap();

        let config = RagConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.chunking.threshold_chars, 50);
        assert_eq!(config.chunking.window_chars, 40);

        let missing = RagConfig::from_toml_file(dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(RagError::Io(_))));
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!(StoreBackend::parse("Memory").unwrap(), StoreBackend::Memory);
        assert_eq!(StoreBackend::parse("qdrant").unwrap(), StoreBackend::Qdrant);
        assert_eq!(StoreBackend::Qdrant.as_str(), "qdrant");
    }
}
