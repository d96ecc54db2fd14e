//! [`ChunkStore`] backed by SQLite and sqlite-vec.
//!
//! Embeddings live in `chunks.embedding` as vector literals. Native search
//! ranks them with `vec_distance_cosine`, which parses the literal directly,
//! and the query vector is always bound as a parameter.
//!
//! The schema CHECK keeps unreadable literals out of the table. Native search
//! still filters on JSON shape and length before calling into sqlite-vec, so a
//! row written with constraints disabled cannot fail every query.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use super::{ChunkStore, NewDocument, StoreDiagnostics, StoreError, StoredChunk};
use crate::db::meta;
use crate::search::{codec, SearchResult};

const NEAREST_SQL: &str = "\
    SELECT d.title, d.source_path, c.chunk_index, c.content, \
           1.0 - vec_distance_cosine(c.embedding, ?1) AS score \
    FROM chunks c \
    JOIN documents d ON c.document_id = d.id \
    WHERE CASE WHEN json_valid(c.embedding) \
               THEN json_array_length(c.embedding) = ?3 ELSE 0 END \
    ORDER BY vec_distance_cosine(c.embedding, ?1), c.id \
    LIMIT ?2";

const ALL_CHUNKS_SQL: &str = "\
    SELECT c.id, c.content, c.chunk_index, c.embedding, d.title, d.source_path \
    FROM chunks c \
    JOIN documents d ON c.document_id = d.id \
    ORDER BY c.id";

/// SQLite-backed store. Cloning shares the same connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    dimensions: usize,
    embedding_model: String,
}

impl SqliteStore {
    /// Wrap an already-initialized connection (see [`crate::db`]).
    ///
    /// `embedding_model` is recorded in `schema_meta` whenever the store is cleared.
    pub fn new(conn: Connection, dimensions: usize, embedding_model: &str) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            dimensions,
            embedding_model: embedding_model.to_string(),
        }
    }

    /// Open the database file, initializing the schema for `dimensions`.
    pub fn open(path: impl AsRef<Path>, dimensions: usize, embedding_model: &str) -> Result<Self> {
        let conn = crate::db::open_database(path, embedding_model, dimensions)?;
        Ok(Self::new(conn, dimensions, embedding_model))
    }

    /// In-memory store, mainly for tests and demos.
    pub fn open_in_memory(dimensions: usize, embedding_model: &str) -> Result<Self> {
        let conn = crate::db::open_memory_database(embedding_model, dimensions)?;
        Ok(Self::new(conn, dimensions, embedding_model))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Run `f` with exclusive access to the underlying connection.
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self.lock()?;
        f(&mut conn)
    }
}

/// Insert a document row inside an open transaction. Returns its id.
pub fn insert_document_row(
    tx: &Transaction,
    title: &str,
    source_path: Option<&str>,
) -> Result<i64, StoreError> {
    let now = chrono::Utc::now().to_rfc3339();
    tx.execute(
        "INSERT INTO documents (title, source_path, indexed_at) VALUES (?1, ?2, ?3)",
        params![title, source_path, now],
    )?;
    Ok(tx.last_insert_rowid())
}

/// Insert one chunk inside an open transaction, rejecting vectors of the wrong dimension.
pub fn insert_chunk(
    tx: &Transaction,
    document_id: i64,
    chunk_index: usize,
    content: &str,
    embedding: &[f32],
    dimensions: usize,
) -> Result<i64, StoreError> {
    if embedding.len() != dimensions {
        return Err(StoreError::Dimension {
            expected: dimensions,
            actual: embedding.len(),
        });
    }
    let literal = codec::encode(embedding);
    tx.execute(
        "INSERT INTO chunks (document_id, chunk_index, content, embedding) VALUES (?1, ?2, ?3, ?4)",
        params![document_id, chunk_index as i64, content, literal],
    )?;
    Ok(tx.last_insert_rowid())
}

impl ChunkStore for SqliteStore {
    fn insert_document(&self, doc: &NewDocument) -> Result<i64, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let document_id = insert_document_row(&tx, &doc.title, doc.source_path.as_deref())?;
        for chunk in &doc.chunks {
            insert_chunk(
                &tx,
                document_id,
                chunk.index,
                &chunk.content,
                &chunk.embedding,
                self.dimensions,
            )?;
        }

        tx.commit()?;
        tracing::debug!(document_id, title = %doc.title, chunks = doc.chunks.len(), "document stored");
        Ok(document_id)
    }

    fn nearest(&self, query_literal: &str, limit: usize) -> Result<Vec<SearchResult>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(NEAREST_SQL)?;
        let rows = stmt
            .query_map(
                params![query_literal, limit as i64, self.dimensions as i64],
                |row| {
                    Ok(SearchResult {
                        document_title: row.get(0)?,
                        source_path: row.get(1)?,
                        chunk_index: row.get::<_, i64>(2)? as usize,
                        content: row.get(3)?,
                        score: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn all_chunks(&self) -> Result<Vec<StoredChunk>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(ALL_CHUNKS_SQL)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(StoredChunk {
                    chunk_id: row.get(0)?,
                    content: row.get(1)?,
                    chunk_index: row.get::<_, i64>(2)? as usize,
                    embedding: row.get(3)?,
                    document_title: row.get(4)?,
                    source_path: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn sample_embedding(&self) -> Result<Option<String>, StoreError> {
        let conn = self.lock()?;
        let literal = conn
            .query_row("SELECT embedding FROM chunks ORDER BY id LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(literal)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute_batch(
            "DELETE FROM chunks;
             DELETE FROM documents;
             DELETE FROM sqlite_sequence WHERE name IN ('chunks', 'documents');",
        )?;
        // Every vector written from now on comes from the configured model
        meta::set_embedding_model(&tx, &self.embedding_model)?;
        tx.commit()?;
        tracing::info!(embedding_model = %self.embedding_model, "store cleared");
        Ok(())
    }

    fn diagnostics(&self) -> Result<StoreDiagnostics, StoreError> {
        let conn = self.lock()?;
        let documents: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?;
        let (chunks, unique_documents, orphaned_chunks): (i64, i64, i64) = conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT c.document_id), \
                    COUNT(CASE WHEN d.id IS NULL THEN 1 END) \
             FROM chunks c LEFT JOIN documents d ON c.document_id = d.id",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;

        let sample: Option<(String, String)> = conn
            .query_row(
                "SELECT content, embedding FROM chunks ORDER BY id LIMIT 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
        let (sample_chunk_preview, sample_embedding_preview): (Option<String>, Option<String>) =
            match sample {
                Some((content, embedding)) => (
                    Some(content.chars().take(100).collect()),
                    Some(embedding.chars().take(200).collect()),
                ),
                None => (None, None),
            };

        Ok(StoreDiagnostics {
            documents: documents as u64,
            chunks: chunks as u64,
            unique_documents: unique_documents as u64,
            orphaned_chunks: orphaned_chunks as u64,
            sample_chunk_preview,
            sample_embedding_preview,
        })
    }
}
