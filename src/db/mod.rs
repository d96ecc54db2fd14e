//! SQLite database setup: extension loading, schema, metadata, and health checks.

pub mod meta;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use sqlite_vec::sqlite3_vec_init;
use std::path::Path;
use std::sync::Once;

static SQLITE_VEC_INIT: Once = Once::new();

/// Register the sqlite-vec extension globally. Safe to call multiple times.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Open (or create) the VecMind database at the given path, with sqlite-vec
/// loaded and the schema initialized for `dimensions`-component vectors.
///
/// Fails when the file was created for a different dimension.
pub fn open_database(
    path: impl AsRef<Path>,
    embedding_model: &str,
    dimensions: usize,
) -> Result<Connection> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }

    load_sqlite_vec();

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    // WAL lets concurrent searches read while an ingestion writes
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;

    initialize(&conn, embedding_model, dimensions)?;

    tracing::info!(path = %path.display(), dimensions, "database initialized");
    Ok(conn)
}

/// Open an in-memory database with the schema initialized.
pub fn open_memory_database(embedding_model: &str, dimensions: usize) -> Result<Connection> {
    load_sqlite_vec();
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    initialize(&conn, embedding_model, dimensions)?;
    Ok(conn)
}

/// Create tables and metadata in one transaction, then check compatibility.
pub fn initialize(conn: &Connection, embedding_model: &str, dimensions: usize) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    schema::init_schema(&tx, dimensions).context("failed to initialize schema")?;
    meta::record_defaults(&tx, embedding_model, dimensions)
        .context("failed to record database metadata")?;
    tx.commit()?;

    meta::verify(conn, dimensions)?;
    Ok(())
}

/// Summary produced by [`check_database_health`].
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub schema_version: u32,
    pub sqlite_vec_version: String,
    pub embedding_model: Option<String>,
    pub embedding_dimensions: Option<usize>,
    pub document_count: u64,
    pub chunk_count: u64,
    pub integrity_ok: bool,
    pub integrity_details: String,
}

/// Run `PRAGMA integrity_check` and collect version and row-count information.
pub fn check_database_health(conn: &Connection) -> Result<HealthReport> {
    let schema_version = meta::get_schema_version(conn)?;
    let sqlite_vec_version: String = conn.query_row("SELECT vec_version()", [], |r| r.get(0))?;
    let embedding_model = meta::get_embedding_model(conn)?;
    let embedding_dimensions = meta::get_embedding_dimensions(conn)?;

    let document_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?;
    let chunk_count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |r| r.get(0))?;

    let integrity_details: String =
        conn.query_row("PRAGMA integrity_check", [], |r| r.get(0))?;

    Ok(HealthReport {
        schema_version,
        sqlite_vec_version,
        embedding_model,
        embedding_dimensions,
        document_count: document_count as u64,
        chunk_count: chunk_count as u64,
        integrity_ok: integrity_details == "ok",
        integrity_details,
    })
}
