//! CLI `index` and `reindex` commands.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use vecmind::config::VecmindConfig;
use vecmind::server::build_state;

/// Index the configured data directory, optionally clearing stored data first.
pub async fn index(config: &VecmindConfig, clear_first: bool) -> Result<()> {
    let state = build_state(config)?;
    let indexer = &state.indexer;

    if clear_first {
        indexer.clear().await.context("failed to clear stored documents")?;
        println!("Cleared existing documents.");
    }

    let files = indexer.source_files();
    if files.is_empty() {
        println!("No .txt or .md files found in {}", indexer.data_dir().display());
        return Ok(());
    }

    println!("Indexing {} file(s) from {}...", files.len(), indexer.data_dir().display());

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let mut chunks = 0;
    for path in &files {
        pb.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        let report = indexer
            .index_file(path)
            .await
            .with_context(|| format!("failed to index {}", path.display()))?;
        chunks += report.chunks;
        pb.inc(1);
    }

    pb.finish_and_clear();
    println!("Indexed {} document(s), {chunks} chunk(s).", files.len());
    Ok(())
}
