use crate::config::ChunkingConfig;
use crate::error::{IngestError, Result};

/// Splits oversized documents into fixed-width character windows
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    /// Create a new chunker, rejecting invalid configuration
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate().map_err(IngestError::invalid_config)?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Chunk a single document; short documents come back unchanged
    #[must_use]
    pub fn chunk(&self, document: String) -> Vec<String> {
        if document.chars().count() > self.config.threshold_chars {
            chunk_text(&document, self.config.window_chars)
        } else {
            vec![document]
        }
    }

    /// Chunk every document, keeping input order
    #[must_use]
    pub fn chunk_all(&self, documents: Vec<String>) -> Vec<String> {
        let before = documents.len();
        let chunks: Vec<String> = documents
            .into_iter()
            .flat_map(|doc| self.chunk(doc))
            .collect();
        log::debug!("Chunked {before} documents into {} pieces", chunks.len());
        chunks
    }
}

/// Split `text` into consecutive windows of `max_chars` characters.
///
/// Windows do not overlap and the last one may be shorter. Characters are
/// Unicode scalar values, so multi-byte text is never cut mid-character.
#[must_use]
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let window = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == window {
            chunks.push(text[start..idx].to_string());
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(text[start..].to_string());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_chunk_text_windows() {
        assert_eq!(chunk_text("abcdefg", 3), vec!["abc", "def", "g"]);
        assert_eq!(chunk_text("abcdef", 3), vec!["abc", "def"]);
        assert_eq!(chunk_text("ab", 3), vec!["ab"]);
        assert!(chunk_text("", 3).is_empty());
    }

    #[test]
    fn test_chunk_text_counts_characters_not_bytes() {
        let chunks = chunk_text("héllo wörld", 4);
        assert_eq!(chunks, vec!["héll", "o wö", "rld"]);
        assert_eq!(chunks.concat(), "héllo wörld");
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let chunker = Chunker::new(ChunkingConfig {
            threshold_chars: 6,
            window_chars: 4,
        })
        .unwrap();

        assert_eq!(chunker.chunk("abcdef".into()), vec!["abcdef"]);
        assert_eq!(chunker.chunk("abcdefg".into()), vec!["abcd", "efg"]);
    }

    #[test]
    fn test_chunk_all_keeps_order() {
        let chunker = Chunker::new(ChunkingConfig {
            threshold_chars: 3,
            window_chars: 2,
        })
        .unwrap();

        let out = chunker.chunk_all(vec!["one".into(), "three".into(), "x".into()]);
        assert_eq!(out, vec!["one", "th", "re", "e", "x"]);
    }

    #[test]
    fn test_default_config_matches_faq_sizes() {
        let chunker = Chunker::new(ChunkingConfig::default()).unwrap();
        let long = "a".repeat(2500);

        let chunks = chunker.chunk(long);
        let sizes: Vec<usize> = chunks.iter().map(String::len).collect();
        assert_eq!(sizes, vec![1000, 1000, 500]);
        assert_eq!(chunker.chunk("a".repeat(1200)).len(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = Chunker::new(ChunkingConfig {
            threshold_chars: 10,
            window_chars: 0,
        })
        .unwrap_err();
        assert!(matches!(err, IngestError::InvalidConfig(_)));
    }
}
