//! Database metadata in `schema_meta`: schema version, the embedding model
//! that produced the stored vectors, and their dimension.

use rusqlite::{params, Connection, OptionalExtension};

/// The schema version that the current binary writes and reads.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// The database cannot be used with the running binary or configuration.
#[derive(Debug, thiserror::Error)]
pub enum CompatibilityError {
    #[error("database schema version {found} is newer than supported version {supported}")]
    NewerSchema { found: u32, supported: u32 },
    #[error(
        "database stores {stored}-dimensional vectors but embedding.dimensions is {configured}; \
         restore the setting or delete the database and index again"
    )]
    Dimensions { stored: usize, configured: usize },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

fn get_value(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = ?1",
        [key],
        |row| row.get(0),
    )
    .optional()
}

/// Get the schema version, or 0 when none is recorded.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    Ok(get_value(conn, "schema_version")?
        .and_then(|v| v.parse().ok())
        .unwrap_or(0))
}

/// Get the stored embedding model identifier, if any.
pub fn get_embedding_model(conn: &Connection) -> rusqlite::Result<Option<String>> {
    get_value(conn, "embedding_model")
}

/// Set the stored embedding model identifier.
pub fn set_embedding_model(conn: &Connection, model: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_meta (key, value) VALUES ('embedding_model', ?1)",
        [model],
    )?;
    Ok(())
}

/// Get the vector dimension the `chunks` table was created with.
pub fn get_embedding_dimensions(conn: &Connection) -> rusqlite::Result<Option<usize>> {
    Ok(get_value(conn, "embedding_dimensions")?.and_then(|v| v.parse().ok()))
}

/// Record version, model, and dimension for a new database. Existing values are kept.
pub fn record_defaults(
    conn: &Connection,
    embedding_model: &str,
    dimensions: usize,
) -> rusqlite::Result<()> {
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO schema_meta (key, value) VALUES (?1, ?2)")?;
    stmt.execute(params!["schema_version", CURRENT_SCHEMA_VERSION.to_string()])?;
    stmt.execute(params!["embedding_model", embedding_model])?;
    stmt.execute(params!["embedding_dimensions", dimensions.to_string()])?;
    Ok(())
}

/// Refuse databases written by a newer binary or for another vector dimension.
pub fn verify(conn: &Connection, dimensions: usize) -> Result<(), CompatibilityError> {
    let found = get_schema_version(conn)?;
    if found > CURRENT_SCHEMA_VERSION {
        return Err(CompatibilityError::NewerSchema {
            found,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }

    match get_embedding_dimensions(conn)? {
        Some(stored) if stored != dimensions => Err(CompatibilityError::Dimensions {
            stored,
            configured: dimensions,
        }),
        _ => Ok(()),
    }
}
