//! Persistence seam for documents, chunks, and their vectors.
//!
//! [`ChunkStore`] is what the search and ingestion pipelines depend on.
//! [`sqlite::SqliteStore`] is the production implementation. Store methods
//! are synchronous; async callers go through [`run_blocking`], which moves
//! the call onto the blocking pool and bounds it with a timeout.

pub mod sqlite;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::search::SearchResult;

/// A chunk ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewChunk {
    pub index: usize,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A document and all of its chunks, inserted as one unit.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub title: String,
    pub source_path: Option<String>,
    pub chunks: Vec<NewChunk>,
}

/// A persisted chunk with its raw vector literal and parent document metadata.
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub chunk_id: i64,
    pub document_title: String,
    pub source_path: Option<String>,
    pub chunk_index: usize,
    pub content: String,
    /// Vector literal exactly as stored, decoded by the caller.
    pub embedding: String,
}

/// Row counts and samples for diagnosing store health.
#[derive(Debug, Clone, Serialize)]
pub struct StoreDiagnostics {
    pub documents: u64,
    pub chunks: u64,
    pub unique_documents: u64,
    pub orphaned_chunks: u64,
    pub sample_chunk_preview: Option<String>,
    pub sample_embedding_preview: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("embedding has {actual} dimensions, store expects {expected}")]
    Dimension { expected: usize, actual: usize },
    #[error("store operation timed out after {0} ms")]
    Timeout(u64),
    #[error("store task failed: {0}")]
    Task(String),
    #[error("store connection lock poisoned")]
    LockPoisoned,
}

/// Operations the core needs from a vector-capable store.
pub trait ChunkStore: Send + Sync {
    /// Insert a document and every chunk atomically. Returns the new document id.
    fn insert_document(&self, doc: &NewDocument) -> Result<i64, StoreError>;

    /// Native nearest-neighbor query by cosine distance, best first.
    /// `score` is `1 - distance`.
    fn nearest(&self, query_literal: &str, limit: usize) -> Result<Vec<SearchResult>, StoreError>;

    /// Every stored chunk with its raw vector literal, in insertion order.
    fn all_chunks(&self) -> Result<Vec<StoredChunk>, StoreError>;

    /// The vector literal of the first stored chunk, if any.
    fn sample_embedding(&self) -> Result<Option<String>, StoreError>;

    /// Delete all documents and chunks.
    fn clear(&self) -> Result<(), StoreError>;

    fn diagnostics(&self) -> Result<StoreDiagnostics, StoreError>;
}

/// Run a synchronous store operation on the blocking pool, bounded by `timeout`.
///
/// Dropping the returned future abandons the wait. The store call itself
/// finishes in the background and its result is discarded.
pub async fn run_blocking<T, F>(
    store: &Arc<dyn ChunkStore>,
    timeout: Duration,
    op: F,
) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&dyn ChunkStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(store);
    let task = tokio::task::spawn_blocking(move || op(store.as_ref()));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(StoreError::Task(join.to_string())),
        Err(_) => Err(StoreError::Timeout(timeout.as_millis() as u64)),
    }
}
