//! Document ingestion: list source files, chunk, embed, and store each
//! document atomically.

pub mod chunk;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use walkdir::WalkDir;

use crate::config::VecmindConfig;
use crate::embedding::Embedder;
use crate::store::{self, ChunkStore, NewChunk, NewDocument, StoreError};

/// File extensions picked up from the data directory.
const SOURCE_EXTENSIONS: [&str; 2] = ["txt", "md"];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("configuration error: {0}")]
    Configuration(#[source] StoreError),
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl From<StoreError> for IngestError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Dimension { .. } => Self::Configuration(e),
            other => Self::Store(other),
        }
    }
}

/// Outcome of indexing one file.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub document_id: i64,
    pub title: String,
    pub chunks: usize,
}

/// Outcome of indexing a folder.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexReport {
    pub documents: Vec<DocumentReport>,
}

impl IndexReport {
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.documents.iter().map(|d| d.chunks).sum()
    }
}

/// Regular `.txt`/`.md` files directly inside `dir`, sorted by path.
///
/// A missing directory yields an empty list.
pub fn list_source_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    SOURCE_EXTENSIONS
                        .iter()
                        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
                })
        })
        .collect();

    files.sort();
    files
}

/// Chunks, embeds, and stores documents.
#[derive(Clone)]
pub struct Indexer {
    store: Arc<dyn ChunkStore>,
    embedder: Embedder,
    data_dir: PathBuf,
    max_chunk_chars: usize,
    store_timeout: Duration,
}

impl Indexer {
    pub fn new(
        store: Arc<dyn ChunkStore>,
        embedder: Embedder,
        data_dir: impl Into<PathBuf>,
        max_chunk_chars: usize,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            embedder,
            data_dir: data_dir.into(),
            max_chunk_chars,
            store_timeout,
        }
    }

    pub fn from_config(
        store: Arc<dyn ChunkStore>,
        embedder: Embedder,
        config: &VecmindConfig,
    ) -> Self {
        Self::new(
            store,
            embedder,
            config.resolved_data_dir(),
            config.ingest.max_chunk_chars,
            config.search.store_timeout(),
        )
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn source_files(&self) -> Vec<PathBuf> {
        list_source_files(&self.data_dir)
    }

    /// Index every source file in the data directory.
    ///
    /// Each document is stored in its own transaction. The first failing
    /// document aborts the run and leaves earlier documents in place.
    pub async fn index_folder(&self) -> Result<IndexReport, IngestError> {
        let files = self.source_files();
        if files.is_empty() {
            tracing::info!(dir = %self.data_dir.display(), "no .txt/.md files found, nothing to index");
            return Ok(IndexReport::default());
        }

        let mut report = IndexReport::default();
        for path in &files {
            report.documents.push(self.index_file(path).await?);
        }

        tracing::info!(
            documents = report.document_count(),
            chunks = report.chunk_count(),
            "indexing complete"
        );
        Ok(report)
    }

    /// Delete all stored data, then index the data directory again.
    pub async fn reindex(&self) -> Result<IndexReport, IngestError> {
        self.clear().await?;
        self.index_folder().await
    }

    /// Remove every stored document and chunk.
    pub async fn clear(&self) -> Result<(), IngestError> {
        store::run_blocking(&self.store, self.store_timeout, |s| s.clear()).await?;
        tracing::info!("cleared all documents and chunks");
        Ok(())
    }

    /// Chunk, embed, and store a single file as one document.
    pub async fn index_file(&self, path: &Path) -> Result<DocumentReport, IngestError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| IngestError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let title = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        tracing::info!(file = %title, "indexing document");
        let document = self
            .build_document(title, Some(path.display().to_string()), &text)
            .await;
        let chunks = document.chunks.len();
        let title = document.title.clone();

        let document_id = store::run_blocking(&self.store, self.store_timeout, move |s| {
            s.insert_document(&document)
        })
        .await?;

        Ok(DocumentReport {
            document_id,
            title,
            chunks,
        })
    }

    /// Chunk and embed `text` without touching the store.
    pub async fn build_document(
        &self,
        title: String,
        source_path: Option<String>,
        text: &str,
    ) -> NewDocument {
        let mut chunks = Vec::new();
        for (index, content) in chunk::chunk_text(text, self.max_chunk_chars)
            .into_iter()
            .enumerate()
        {
            let embedding = self.embedder.embed(&content).await;
            chunks.push(NewChunk {
                index,
                content,
                embedding,
            });
        }

        NewDocument {
            title,
            source_path,
            chunks,
        }
    }
}
