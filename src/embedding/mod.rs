//! Text-to-vector embedding pipeline.
//!
//! [`Embedder`] tries the configured remote provider and falls back to the
//! deterministic [`hashed::hashed_embedding`] whenever no API key is set or
//! the remote call fails. Embedding a text therefore never fails on its own.

pub mod hashed;
pub mod remote;

use std::sync::Arc;

use crate::config::EmbeddingConfig;
use remote::RemoteEmbedder;

/// Number of dimensions in the embedding vectors (text-embedding-3-small).
pub const EMBEDDING_DIM: usize = 1536;

/// Raised when a query vector was not produced within the caller's deadline.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding timed out after {0} ms")]
    Timeout(u64),
}

/// Shared, read-only embedding provider. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct Embedder {
    remote: Option<Arc<RemoteEmbedder>>,
    dimensions: usize,
}

impl Embedder {
    /// Build from config. A missing API key yields a fallback-only embedder.
    pub fn from_config(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        let remote = match config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => {
                let client = RemoteEmbedder::new(config, key)?;
                tracing::info!(model = %client.model(), "remote embedding provider configured");
                Some(Arc::new(client))
            }
            None => {
                tracing::info!("no embedding API key configured, using hash fallback embeddings");
                None
            }
        };

        Ok(Self {
            remote,
            dimensions: config.dimensions,
        })
    }

    /// An embedder that never contacts a remote provider.
    pub fn fallback_only(dimensions: usize) -> Self {
        Self {
            remote: None,
            dimensions,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Embed a single text into a vector of exactly [`Self::dimensions`] components.
    ///
    /// A failed remote call is logged with `warn!` and answered by the fallback.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        let text = normalize_input(text);

        let Some(remote) = &self.remote else {
            return hashed::hashed_embedding(&text, self.dimensions);
        };

        match remote.create_embedding(&text).await {
            Ok(vector) => vector,
            Err(remote::RemoteError::RateLimited) => {
                tracing::warn!("embedding quota exceeded, using fallback embeddings");
                hashed::hashed_embedding(&text, self.dimensions)
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote embedding failed, using fallback embeddings");
                hashed::hashed_embedding(&text, self.dimensions)
            }
        }
    }
}

/// Replace newlines with spaces before embedding.
pub fn normalize_input(text: &str) -> String {
    text.replace('\n', " ")
}
