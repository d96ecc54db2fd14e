mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vecmind::config::VecmindConfig;

#[derive(Parser)]
#[command(name = "vecmind", version, about = "Semantic search over local documents")]
struct Cli {
    /// Path to a config file (defaults to ~/.vecmind/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API
    Serve,
    /// Index every .txt/.md file in the data directory
    Index,
    /// Delete all stored data, then index the data directory again
    Reindex,
    /// Search indexed documents from the terminal
    Search {
        query: String,
        /// Number of results to return
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        top_k: Option<u64>,
    },
    /// Print database health and chunk statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => VecmindConfig::load_from(path)?,
        None => VecmindConfig::load()?,
    };

    // Log to stderr so stdout stays clean for command output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => vecmind::server::serve(config).await?,
        Command::Index => cli::index::index(&config, false).await?,
        Command::Reindex => cli::index::index(&config, true).await?,
        Command::Search { query, top_k } => {
            let top_k = top_k.map_or(config.search.default_top_k, |k| k as usize);
            cli::search::search(&config, &query, top_k).await?;
        }
        Command::Stats => cli::stats::stats(&config)?,
    }

    Ok(())
}
