use serde::{Deserialize, Serialize};

/// A ranked search result.
///
/// `position` is the insertion position of the document in the local store, or
/// the point id for the remote index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub position: u64,
    pub document: String,
    pub score: f32,
}
