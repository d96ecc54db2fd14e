//! CLI `stats` command: database health plus chunk statistics.

use anyhow::{Context, Result};

use vecmind::config::VecmindConfig;
use vecmind::db;
use vecmind::store::sqlite::SqliteStore;
use vecmind::store::ChunkStore;

pub fn stats(config: &VecmindConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `vecmind index` to create it.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

    let conn = db::open_database(&db_path, &config.embedding.model, config.embedding.dimensions)
        .context("failed to open database (may be corrupt)")?;
    let report = db::check_database_health(&conn).context("failed to run health check")?;

    let store = SqliteStore::new(conn, config.embedding.dimensions, &config.embedding.model);
    let diagnostics = store.diagnostics().context("failed to collect chunk statistics")?;

    println!("VecMind Stats");
    println!("=============");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!("sqlite-vec:        {}", report.sqlite_vec_version);
    match report.embedding_dimensions {
        Some(dims) => println!("Vector dimension:  {dims}"),
        None => println!("Vector dimension:  (not set)"),
    }
    println!();
    println!("Embedding model:");
    println!("  Stored:          {}", report.embedding_model.as_deref().unwrap_or("(not set)"));
    println!("  Configured:      {}", config.embedding.model);
    if let Some(ref stored) = report.embedding_model {
        if stored != &config.embedding.model {
            println!("  WARNING: model mismatch! Run `vecmind reindex` to rebuild vectors.");
        }
    }
    println!();
    println!("Row counts:");
    println!("  Documents:       {}", diagnostics.documents);
    println!("  Chunks:          {}", diagnostics.chunks);
    println!("  Orphaned chunks: {}", diagnostics.orphaned_chunks);
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
