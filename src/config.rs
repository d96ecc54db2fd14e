use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::embedding::EMBEDDING_DIM;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct VecmindConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Bearer token for the remote provider. Absent means always use the hash fallback.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub dimensions: usize,
    pub remote_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub default_top_k: usize,
    pub embed_timeout_ms: u64,
    pub store_timeout_ms: u64,
    /// Run the in-process ranking when the native query errors, not only when it is empty.
    pub fallback_on_store_error: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IngestConfig {
    pub data_dir: String,
    pub max_chunk_chars: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8000,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_vecmind_dir()
            .join("vecmind.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".into(),
            model: "text-embedding-3-small".into(),
            dimensions: EMBEDDING_DIM,
            remote_timeout_secs: 30,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            embed_timeout_ms: 60_000,
            store_timeout_ms: 30_000,
            fallback_on_store_error: false,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".into(),
            max_chunk_chars: 800,
        }
    }
}

impl SearchConfig {
    pub fn embed_timeout(&self) -> Duration {
        Duration::from_millis(self.embed_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

/// Returns `~/.vecmind/`, or `./.vecmind` when no home directory is known.
pub fn default_vecmind_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".vecmind")
}

/// Returns the default config file path: `~/.vecmind/config.toml`
pub fn default_config_path() -> PathBuf {
    default_vecmind_dir().join("config.toml")
}

impl VecmindConfig {
    /// Load config from the default TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            VecmindConfig::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the search and storage layers cannot work with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.search.default_top_k >= 1,
            "search.default_top_k must be at least 1, got {}",
            self.search.default_top_k
        );
        anyhow::ensure!(
            self.embedding.dimensions >= 1,
            "embedding.dimensions must be at least 1"
        );
        Ok(())
    }

    /// Apply environment variable overrides
    /// (OPENAI_API_KEY, VECMIND_DB, VECMIND_DATA_DIR, VECMIND_LOG_LEVEL, PORT).
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            if !val.trim().is_empty() {
                self.embedding.api_key = Some(val);
            }
        }
        if let Ok(val) = std::env::var("VECMIND_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("VECMIND_DATA_DIR") {
            self.ingest.data_dir = val;
        }
        if let Ok(val) = std::env::var("VECMIND_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("PORT") {
            self.server.port = val
                .parse()
                .with_context(|| format!("PORT must be a port number, got {val:?}"))?;
        }
        Ok(())
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// Resolve the document directory, expanding `~` if needed.
    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_tilde(&self.ingest.data_dir)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
