//! Query pipeline: vector literals, cosine ranking, and the native/fallback
//! search orchestration.

pub mod codec;
pub mod engine;
pub mod similarity;
pub mod types;

pub use engine::{EngineOptions, SearchEngine};
pub use types::{SearchOutcome, SearchPath, SearchResult};

use crate::embedding::EmbeddingError;
use crate::store::StoreError;
use similarity::LengthMismatch;

/// Request-level search failures. Per-chunk problems never surface here.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("embedding generation failed: {0}")]
    Embedding(#[from] EmbeddingError),
    #[error("database query failed: {0}")]
    Store(#[from] StoreError),
    #[error("internal consistency error: {0}")]
    Consistency(#[from] LengthMismatch),
}
