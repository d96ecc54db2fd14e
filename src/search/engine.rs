//! Search orchestration.
//!
//! A request moves through fixed steps: embed the query, run the store's
//! native cosine search, and return those rows if there are any. When the
//! native query comes back empty, every stored vector is decoded and ranked
//! in-process instead. Both paths yield the same [`SearchResult`] shape.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use super::similarity::{self, LengthMismatch};
use super::{codec, SearchError, SearchOutcome, SearchPath, SearchResult};
use crate::config::SearchConfig;
use crate::embedding::{Embedder, EmbeddingError};
use crate::store::{self, ChunkStore, StoredChunk};

/// Timeouts and fallback policy for a [`SearchEngine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub embed_timeout: Duration,
    pub store_timeout: Duration,
    pub fallback_on_store_error: bool,
}

impl From<&SearchConfig> for EngineOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            embed_timeout: config.embed_timeout(),
            store_timeout: config.store_timeout(),
            fallback_on_store_error: config.fallback_on_store_error,
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

/// Shared search entry point. Holds no per-request state.
#[derive(Clone)]
pub struct SearchEngine {
    store: Arc<dyn ChunkStore>,
    embedder: Embedder,
    options: EngineOptions,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn ChunkStore>, embedder: Embedder, options: EngineOptions) -> Self {
        Self {
            store,
            embedder,
            options,
        }
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// Return the `top_k` chunks most similar to `query`. `top_k` must be at least 1.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<SearchOutcome, SearchError> {
        let started = Instant::now();

        let query_vector = self.embed_query(query).await?;
        let expected = self.embedder.dimensions();
        if query_vector.len() != expected {
            return Err(LengthMismatch {
                left: query_vector.len(),
                right: expected,
            }
            .into());
        }

        let literal = codec::encode(&query_vector);
        match store::run_blocking(&self.store, self.options.store_timeout, move |s| {
            s.nearest(&literal, top_k)
        })
        .await
        {
            Ok(rows) if !rows.is_empty() => {
                info!(
                    results = rows.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "native vector search succeeded"
                );
                return Ok(SearchOutcome {
                    results: rows,
                    path: SearchPath::Native,
                    skipped: 0,
                });
            }
            Ok(_) => {
                warn!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "native vector search returned 0 rows, falling back to in-process ranking"
                );
            }
            Err(e) if self.options.fallback_on_store_error => {
                warn!(error = %e, "native vector search failed, falling back to in-process ranking");
            }
            Err(e) => {
                error!(error = %e, "native vector search failed");
                return Err(e.into());
            }
        }

        self.fallback_search(&query_vector, top_k).await
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbeddingError> {
        let timeout = self.options.embed_timeout;
        tokio::time::timeout(timeout, self.embedder.embed(query))
            .await
            .map_err(|_| {
                error!(timeout_ms = timeout.as_millis() as u64, "query embedding timed out");
                EmbeddingError::Timeout(timeout.as_millis() as u64)
            })
    }

    /// Exhaustive ranking over every stored chunk.
    async fn fallback_search(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<SearchOutcome, SearchError> {
        let started = Instant::now();
        let chunks =
            store::run_blocking(&self.store, self.options.store_timeout, |s| s.all_chunks())
                .await?;

        let total = chunks.len();
        let (candidates, skipped) = decode_candidates(chunks, query_vector.len());
        let ranked = similarity::rank(query_vector, candidates, top_k)?;

        let results: Vec<SearchResult> = ranked
            .into_iter()
            .map(|r| SearchResult {
                document_title: r.item.document_title,
                source_path: r.item.source_path,
                chunk_index: r.item.chunk_index,
                content: r.item.content,
                score: r.score,
            })
            .collect();

        info!(
            candidates = total,
            skipped,
            results = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fallback ranking complete"
        );

        Ok(SearchOutcome {
            results,
            path: SearchPath::Fallback,
            skipped,
        })
    }
}

/// Decode every stored literal, dropping chunks that cannot be ranked.
fn decode_candidates(
    chunks: Vec<StoredChunk>,
    dimensions: usize,
) -> (Vec<(StoredChunk, Vec<f32>)>, usize) {
    let mut skipped = 0;
    let mut candidates = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        match codec::decode(&chunk.embedding) {
            Ok(vector) if vector.len() == dimensions => candidates.push((chunk, vector)),
            Ok(vector) => {
                warn!(
                    chunk_id = chunk.chunk_id,
                    expected = dimensions,
                    actual = vector.len(),
                    "skipping chunk with wrong embedding dimension"
                );
                skipped += 1;
            }
            Err(e) => {
                warn!(chunk_id = chunk.chunk_id, error = %e, "skipping chunk with unreadable embedding");
                skipped += 1;
            }
        }
    }

    (candidates, skipped)
}
