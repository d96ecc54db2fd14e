#![allow(dead_code)]

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::Connection;
use vecmind::db;
use vecmind::embedding::Embedder;
use vecmind::search::{EngineOptions, SearchEngine, SearchResult};
use vecmind::store::sqlite::SqliteStore;
use vecmind::store::{
    ChunkStore, NewChunk, NewDocument, StoreDiagnostics, StoreError, StoredChunk,
};

pub const MODEL: &str = "text-embedding-3-small";

/// Open a fresh in-memory database with schema and metadata for `dimensions`.
pub fn test_db(dimensions: usize) -> Connection {
    db::load_sqlite_vec();
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    db::initialize(&conn, MODEL, dimensions).unwrap();
    conn
}

pub fn sqlite_store(dimensions: usize) -> SqliteStore {
    SqliteStore::open_in_memory(dimensions, MODEL).unwrap()
}

/// Overwrite one chunk's literal with the schema CHECK switched off.
pub fn corrupt_chunk(store: &SqliteStore, chunk_index: usize, literal: &str) {
    store
        .with_connection(|conn| {
            conn.pragma_update(None, "ignore_check_constraints", "ON")?;
            conn.execute(
                "UPDATE chunks SET embedding = ?1 WHERE chunk_index = ?2",
                rusqlite::params![literal, chunk_index as i64],
            )?;
            conn.pragma_update(None, "ignore_check_constraints", "OFF")?;
            Ok(())
        })
        .unwrap();
}

/// Collects formatted WARN and ERROR events emitted on the current thread.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    /// Route events on this thread into the capture until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Lines logged at WARN level that contain `needle`.
    pub fn warnings(&self, needle: &str) -> usize {
        self.contents()
            .lines()
            .filter(|line| line.contains("WARN") && line.contains(needle))
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings("")
    }
}

/// A unit vector with a spike at `pos`.
pub fn spike(dimensions: usize, pos: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; dimensions];
    v[pos % dimensions] = 1.0;
    v
}

/// Store one document whose chunks are embedded with the fallback embedder.
pub async fn insert_text_document(
    store: &dyn ChunkStore,
    embedder: &Embedder,
    title: &str,
    paragraphs: &[&str],
) -> i64 {
    let mut chunks = Vec::new();
    for (index, content) in paragraphs.iter().enumerate() {
        chunks.push(NewChunk {
            index,
            content: content.to_string(),
            embedding: embedder.embed(content).await,
        });
    }
    store
        .insert_document(&NewDocument {
            title: title.to_string(),
            source_path: Some(format!("data/{title}")),
            chunks,
        })
        .unwrap()
}

pub fn engine(store: Arc<dyn ChunkStore>, embedder: Embedder) -> SearchEngine {
    engine_with(store, embedder, EngineOptions::default())
}

pub fn engine_with(
    store: Arc<dyn ChunkStore>,
    embedder: Embedder,
    options: EngineOptions,
) -> SearchEngine {
    SearchEngine::new(store, embedder, options)
}

pub fn options(fallback_on_store_error: bool) -> EngineOptions {
    EngineOptions {
        embed_timeout: Duration::from_secs(5),
        store_timeout: Duration::from_secs(5),
        fallback_on_store_error,
    }
}

/// How a [`ScriptedStore`] answers native searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Native {
    /// Delegate to the wrapped SQLite store.
    Real,
    /// Always return zero rows.
    Empty,
    /// Always fail.
    Fail,
}

/// Wraps a real store but scripts the native query and records fallback scans.
pub struct ScriptedStore {
    pub inner: SqliteStore,
    pub native: Native,
    all_chunks_called: AtomicBool,
}

impl ScriptedStore {
    pub fn new(inner: SqliteStore, native: Native) -> Self {
        Self {
            inner,
            native,
            all_chunks_called: AtomicBool::new(false),
        }
    }

    pub fn scanned(&self) -> bool {
        self.all_chunks_called.load(Ordering::SeqCst)
    }
}

impl ChunkStore for ScriptedStore {
    fn insert_document(&self, doc: &NewDocument) -> Result<i64, StoreError> {
        self.inner.insert_document(doc)
    }

    fn nearest(&self, query_literal: &str, limit: usize) -> Result<Vec<SearchResult>, StoreError> {
        match self.native {
            Native::Real => self.inner.nearest(query_literal, limit),
            Native::Empty => Ok(Vec::new()),
            Native::Fail => Err(StoreError::Task("scripted native failure".into())),
        }
    }

    fn all_chunks(&self) -> Result<Vec<StoredChunk>, StoreError> {
        self.all_chunks_called.store(true, Ordering::SeqCst);
        self.inner.all_chunks()
    }

    fn sample_embedding(&self) -> Result<Option<String>, StoreError> {
        self.inner.sample_embedding()
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.inner.clear()
    }

    fn diagnostics(&self) -> Result<StoreDiagnostics, StoreError> {
        self.inner.diagnostics()
    }
}
