//! SQL DDL for the VecMind tables.
//!
//! `documents` holds one row per ingested file, `chunks` holds the ordered
//! text spans with their embedding stored as a vector literal
//! (`[0.123456,...]`) that sqlite-vec reads directly. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.
//!
//! The vector dimension is fixed when the database is created: a CHECK on
//! `chunks.embedding` rejects any literal sqlite-vec cannot read as a vector
//! of exactly that length.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    source_path TEXT,
    indexed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id INTEGER NOT NULL REFERENCES documents(id) ON DELETE CASCADE,
    chunk_index INTEGER NOT NULL CHECK(chunk_index >= 0),
    content TEXT NOT NULL,
    embedding TEXT NOT NULL CHECK(vec_length(embedding) = {dimensions}),
    UNIQUE(document_id, chunk_index)
);

CREATE INDEX IF NOT EXISTS idx_chunks_document ON chunks(document_id);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables for `dimensions`-component vectors.
/// Idempotent: an existing `chunks` table keeps the dimension it was created with.
pub fn init_schema(conn: &Connection, dimensions: usize) -> rusqlite::Result<()> {
    conn.execute_batch(&SCHEMA_SQL.replace("{dimensions}", &dimensions.to_string()))
}
