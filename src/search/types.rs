//! Result shapes shared by the native and fallback search paths.

use serde::{Deserialize, Serialize};

/// One ranked chunk, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document_title: String,
    pub source_path: Option<String>,
    pub chunk_index: usize,
    pub content: String,
    /// Cosine similarity, conventionally in `[-1, 1]`. Not clamped.
    pub score: f64,
}

/// Which path produced a [`SearchOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPath {
    /// sqlite-vec distance query inside the store.
    Native,
    /// Exhaustive in-process ranking over every stored vector.
    Fallback,
}

impl SearchPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for SearchPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Results of one search request plus provenance.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Ordered by descending score, at most `top_k` entries.
    pub results: Vec<SearchResult>,
    pub path: SearchPath,
    /// Stored chunks excluded from fallback ranking because their vector was unusable.
    pub skipped: usize,
}
