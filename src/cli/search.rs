use anyhow::Result;

use vecmind::config::VecmindConfig;
use vecmind::server::build_state;

use super::preview;

/// Run a search from the terminal.
pub async fn search(config: &VecmindConfig, query: &str, top_k: usize) -> Result<()> {
    let state = build_state(config)?;
    let outcome = state.engine.search(query, top_k).await?;

    if outcome.results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} result(s) via {} search", outcome.results.len(), outcome.path);
    if outcome.skipped > 0 {
        println!("  ({} chunk(s) skipped: unreadable embeddings)", outcome.skipped);
    }
    println!();

    for (i, result) in outcome.results.iter().enumerate() {
        println!(
            "  {}. {} #{} (score: {:.4})",
            i + 1,
            result.document_title,
            result.chunk_index,
            result.score,
        );
        println!("     {}", preview(&result.content, 120));
        println!();
    }

    Ok(())
}
