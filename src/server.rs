//! HTTP boundary: JSON routes over the search engine, indexer, and store
//! diagnostics.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::VecmindConfig;
use crate::db;
use crate::embedding::Embedder;
use crate::ingest::{IndexReport, Indexer};
use crate::search::{codec, EngineOptions, SearchEngine, SearchError, SearchResult};
use crate::store::sqlite::SqliteStore;
use crate::store::{self, ChunkStore, StoreDiagnostics};

/// Shared state handed to every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub engine: SearchEngine,
    pub indexer: Indexer,
    pub store: Arc<dyn ChunkStore>,
    pub store_timeout: Duration,
    pub default_top_k: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn ChunkStore>, embedder: Embedder, config: &VecmindConfig) -> Self {
        let engine = SearchEngine::new(
            Arc::clone(&store),
            embedder.clone(),
            EngineOptions::from(&config.search),
        );
        let indexer = Indexer::from_config(Arc::clone(&store), embedder, config);
        Self {
            engine,
            indexer,
            store,
            store_timeout: config.search.store_timeout(),
            default_top_k: config.search.default_top_k,
        }
    }
}

/// Open the database and embedding provider described by `config`.
pub fn build_state(config: &VecmindConfig) -> Result<AppState> {
    let db_path = config.resolved_db_path();
    let store = SqliteStore::open(&db_path, config.embedding.dimensions, &config.embedding.model)?;
    tracing::info!(db = %db_path.display(), "database ready");

    // Vectors from another model are not comparable with new query vectors
    store.with_connection(|conn| {
        if let Ok(Some(stored_model)) = db::meta::get_embedding_model(conn) {
            if stored_model != config.embedding.model {
                tracing::warn!(
                    stored = %stored_model,
                    configured = %config.embedding.model,
                    "embedding model changed, run `vecmind reindex` to rebuild all vectors"
                );
            }
        }
        Ok(())
    })?;

    let embedder = Embedder::from_config(&config.embedding)?;
    tracing::info!(remote = embedder.is_remote(), "embedding provider ready");

    let store: Arc<dyn ChunkStore> = Arc::new(store);
    Ok(AppState::new(store, embedder, config))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/index", post(index_docs))
        .route("/reindex", post(reindex_docs))
        .route("/debug/count", get(debug_count))
        .route("/debug/test-vector", get(debug_test_vector))
        .route("/health", get(health))
        .with_state(state)
}

/// Serve the HTTP API until Ctrl-C.
pub async fn serve(config: VecmindConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = build_state(&config)?;

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "VecMind listening at http://{bind_addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}

// ── Error mapping ─────────────────────────────────────────────────────────────

/// A failed request, rendered as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        let detail = match &e {
            SearchError::Embedding(inner) => format!("Embedding generation failed: {inner}"),
            SearchError::Store(inner) => format!("Database query failed: {inner}"),
            SearchError::Consistency(inner) => format!("Internal consistency error: {inner}"),
        };
        Self::internal(detail)
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub top_k: Option<i64>,
}

pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let top_k = match req.top_k {
        None => state.default_top_k,
        Some(k) if k >= 1 => k as usize,
        Some(k) => {
            return Err(ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("top_k must be at least 1, got {k}"),
            ))
        }
    };

    tracing::info!(query_len = req.query.len(), top_k, "search requested");
    let outcome = state.engine.search(&req.query, top_k).await?;
    tracing::info!(path = %outcome.path, results = outcome.results.len(), "search served");

    Ok(Json(outcome.results))
}

fn index_body(report: &IndexReport) -> Value {
    json!({
        "status": "ok",
        "documents": report.document_count(),
        "chunks": report.chunk_count(),
    })
}

pub async fn index_docs(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let report = state.indexer.index_folder().await.map_err(|e| {
        tracing::error!(error = %e, "indexing failed");
        ApiError::internal(format!("Indexing failed: {e}"))
    })?;
    Ok(Json(index_body(&report)))
}

pub async fn reindex_docs(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let report = state.indexer.reindex().await.map_err(|e| {
        tracing::error!(error = %e, "re-indexing failed");
        ApiError::internal(format!("Re-indexing failed: {e}"))
    })?;

    let mut body = index_body(&report);
    body["message"] = json!("Re-indexing complete");
    Ok(Json(body))
}

pub async fn debug_count(
    State(state): State<AppState>,
) -> Result<Json<StoreDiagnostics>, ApiError> {
    let diagnostics = store::run_blocking(&state.store, state.store_timeout, |s| s.diagnostics())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "debug count failed");
            ApiError::internal(format!("Database connection failed: {e}"))
        })?;
    Ok(Json(diagnostics))
}

/// Run one native search and summarize it as `{success, row_count, scores}`.
async fn try_native(state: &AppState, literal: String, limit: usize) -> Value {
    match store::run_blocking(&state.store, state.store_timeout, move |s| {
        s.nearest(&literal, limit)
    })
    .await
    {
        Ok(rows) => json!({
            "success": true,
            "row_count": rows.len(),
            "scores": rows.iter().take(3).map(|r| r.score).collect::<Vec<_>>(),
        }),
        Err(e) => json!({ "success": false, "error": e.to_string() }),
    }
}

/// Diagnose native search against stored and freshly embedded vectors.
pub async fn debug_test_vector(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let sample = store::run_blocking(&state.store, state.store_timeout, |s| s.sample_embedding())
        .await
        .map_err(|e| ApiError::internal(format!("Test vector failed: {e}")))?;

    let Some(sample) = sample else {
        return Ok(Json(json!({ "error": "No chunks in database" })));
    };

    let preview: String = sample.chars().take(200).collect();
    let stored_result = try_native(&state, sample, 5).await;

    let diagnostics = store::run_blocking(&state.store, state.store_timeout, |s| s.diagnostics())
        .await
        .map_err(|e| ApiError::internal(format!("Test vector failed: {e}")))?;

    let query_vector = state.engine.embedder().embed("test query").await;
    let query_literal = codec::encode(&query_vector);
    let query_preview: String = query_literal.chars().take(200).collect();
    let mut query_result = try_native(&state, query_literal, 3).await;
    query_result["query_vector_preview"] = json!(query_preview);

    Ok(Json(json!({
        "sample_vector_preview": preview,
        "test_stored_vector": stored_result,
        "chunk_stats": {
            "total_chunks": diagnostics.chunks,
            "unique_documents": diagnostics.unique_documents,
            "orphaned_chunks": diagnostics.orphaned_chunks,
        },
        "test_with_query_embedding": query_result,
    })))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
