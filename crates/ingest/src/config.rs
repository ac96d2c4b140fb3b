use serde::{Deserialize, Serialize};

/// Configuration for splitting long documents before embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Documents with more characters than this are split
    pub threshold_chars: usize,

    /// Characters per window when a document is split
    pub window_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            threshold_chars: 1200,
            window_chars: 1000,
        }
    }
}

impl ChunkingConfig {
    /// Never split anything
    pub fn disabled() -> Self {
        Self {
            threshold_chars: usize::MAX,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.window_chars == 0 {
            return Err("window_chars must be > 0".to_string());
        }

        if self.window_chars > self.threshold_chars {
            return Err(format!(
                "window_chars ({}) cannot exceed threshold_chars ({})",
                self.window_chars, self.threshold_chars
            ));
        }

        Ok(())
    }
}
