mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{Native, ScriptedStore};
use vecmind::config::EmbeddingConfig;
use vecmind::embedding::{Embedder, EmbeddingError, EMBEDDING_DIM};
use vecmind::search::{EngineOptions, SearchError, SearchPath};
use vecmind::store::{ChunkStore, NewChunk, NewDocument};

#[tokio::test]
async fn empty_store_returns_empty_fallback_result() {
    let store: Arc<dyn ChunkStore> = Arc::new(helpers::sqlite_store(EMBEDDING_DIM));
    let engine = helpers::engine(store, Embedder::fallback_only(EMBEDDING_DIM));

    let outcome = engine.search("anything", 3).await.unwrap();
    assert!(outcome.results.is_empty());
    assert_eq!(outcome.path, SearchPath::Fallback);
    assert_eq!(outcome.skipped, 0);
}

#[tokio::test]
async fn exact_paragraph_ranks_first_via_native_search() {
    let embedder = Embedder::fallback_only(EMBEDDING_DIM);
    let store = helpers::sqlite_store(EMBEDDING_DIM);
    helpers::insert_text_document(&store, &embedder, "doc.txt", &["alpha beta", "gamma delta"])
        .await;

    let engine = helpers::engine(Arc::new(store), embedder);
    let outcome = engine.search("alpha beta", 1).await.unwrap();

    assert_eq!(outcome.path, SearchPath::Native);
    assert_eq!(outcome.results.len(), 1);
    let top = &outcome.results[0];
    assert_eq!(top.content, "alpha beta");
    assert_eq!(top.document_title, "doc.txt");
    assert_eq!(top.chunk_index, 0);
    assert!((top.score - 1.0).abs() < 1e-4, "score was {}", top.score);
}

#[tokio::test]
async fn native_and_fallback_agree_on_ranking() {
    let embedder = Embedder::fallback_only(EMBEDDING_DIM);
    let store = helpers::sqlite_store(EMBEDDING_DIM);
    helpers::insert_text_document(
        &store,
        &embedder,
        "notes.md",
        &["rust ownership", "tokio runtime", "sqlite pragmas", "cosine ranking"],
    )
    .await;

    let native = helpers::engine(
        Arc::new(ScriptedStore::new(store.clone(), Native::Real)),
        embedder.clone(),
    );
    let fallback = helpers::engine(
        Arc::new(ScriptedStore::new(store, Native::Empty)),
        embedder,
    );

    let a = native.search("tokio runtime", 4).await.unwrap();
    let b = fallback.search("tokio runtime", 4).await.unwrap();
    assert_eq!(a.path, SearchPath::Native);
    assert_eq!(b.path, SearchPath::Fallback);

    let a_order: Vec<_> = a.results.iter().map(|r| r.chunk_index).collect();
    let b_order: Vec<_> = b.results.iter().map(|r| r.chunk_index).collect();
    assert_eq!(a_order, b_order);
    for (x, y) in a.results.iter().zip(&b.results) {
        assert!((x.score - y.score).abs() < 1e-4);
    }
}

#[tokio::test]
async fn native_error_is_reported_without_scanning() {
    let store = Arc::new(ScriptedStore::new(helpers::sqlite_store(8), Native::Fail));
    let embedder = Embedder::fallback_only(8);
    helpers::insert_text_document(store.as_ref(), &embedder, "a.txt", &["one", "two"]).await;

    let engine = helpers::engine_with(store.clone(), embedder, helpers::options(false));
    let err = engine.search("one", 2).await.unwrap_err();

    assert!(matches!(err, SearchError::Store(_)), "got {err:?}");
    assert!(err.to_string().starts_with("database query failed"));
    assert!(!store.scanned());
}

#[tokio::test]
async fn native_error_falls_back_when_enabled() {
    let store = Arc::new(ScriptedStore::new(helpers::sqlite_store(8), Native::Fail));
    let embedder = Embedder::fallback_only(8);
    helpers::insert_text_document(store.as_ref(), &embedder, "a.txt", &["one", "two"]).await;

    let engine = helpers::engine_with(store.clone(), embedder, helpers::options(true));
    let outcome = engine.search("two", 1).await.unwrap();

    assert!(store.scanned());
    assert_eq!(outcome.path, SearchPath::Fallback);
    assert_eq!(outcome.results[0].content, "two");
}

fn three_spike_store() -> vecmind::store::sqlite::SqliteStore {
    let store = helpers::sqlite_store(4);
    store
        .insert_document(&NewDocument {
            title: "vectors.txt".into(),
            source_path: None,
            chunks: (0..3)
                .map(|i| NewChunk {
                    index: i,
                    content: format!("chunk {i}"),
                    embedding: helpers::spike(4, i),
                })
                .collect(),
        })
        .unwrap();
    store
}

#[tokio::test]
async fn corrupted_embedding_is_skipped_by_fallback_with_warning() {
    let inner = three_spike_store();
    helpers::corrupt_chunk(&inner, 1, "[not,a,vector]");

    let logs = helpers::LogCapture::default();
    let _guard = logs.install();

    let store = Arc::new(ScriptedStore::new(inner, Native::Empty));
    let engine = helpers::engine(store.clone(), Embedder::fallback_only(4));
    let outcome = engine.search("query", 5).await.unwrap();

    assert!(store.scanned());
    assert_eq!(outcome.path, SearchPath::Fallback);
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results.iter().all(|r| r.chunk_index != 1));
    assert_eq!(logs.warnings("unreadable embedding"), 1, "{}", logs.contents());
}

#[tokio::test]
async fn wrong_dimension_literal_is_skipped_by_fallback_with_warning() {
    let inner = three_spike_store();
    helpers::corrupt_chunk(&inner, 2, "[1.0,0.0]");

    let logs = helpers::LogCapture::default();
    let _guard = logs.install();

    let engine = helpers::engine(
        Arc::new(ScriptedStore::new(inner, Native::Empty)),
        Embedder::fallback_only(4),
    );
    let outcome = engine.search("query", 5).await.unwrap();

    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(logs.warnings("wrong embedding dimension"), 1, "{}", logs.contents());
}

#[tokio::test]
async fn corrupted_embedding_does_not_break_native_search() {
    let store = three_spike_store();
    helpers::corrupt_chunk(&store, 1, "[not,a,vector]");

    let engine = helpers::engine(Arc::new(store), Embedder::fallback_only(4));
    let outcome = engine.search("query", 5).await.unwrap();

    assert_eq!(outcome.path, SearchPath::Native);
    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.results.iter().all(|r| r.chunk_index != 1));
}

#[tokio::test]
async fn top_k_bounds_result_count() {
    let embedder = Embedder::fallback_only(16);
    let store = helpers::sqlite_store(16);
    helpers::insert_text_document(&store, &embedder, "a.txt", &["a", "b", "c"]).await;
    helpers::insert_text_document(&store, &embedder, "b.txt", &["d", "e"]).await;

    let engine = helpers::engine(Arc::new(store), embedder);
    assert_eq!(engine.search("a", 2).await.unwrap().results.len(), 2);
    assert_eq!(engine.search("a", 10).await.unwrap().results.len(), 5);

    let scores: Vec<f64> = engine
        .search("a", 5)
        .await
        .unwrap()
        .results
        .iter()
        .map(|r| r.score)
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn stalled_embedding_provider_times_out() {
    // Accepts connections at the socket level but never answers.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let embedder = Embedder::from_config(&EmbeddingConfig {
        api_key: Some("test-key".into()),
        base_url: format!("http://{addr}/v1"),
        dimensions: 8,
        remote_timeout_secs: 30,
        ..EmbeddingConfig::default()
    })
    .unwrap();

    let store = Arc::new(ScriptedStore::new(helpers::sqlite_store(8), Native::Real));
    let engine = helpers::engine_with(
        store.clone(),
        embedder,
        EngineOptions {
            embed_timeout: Duration::from_millis(200),
            ..helpers::options(false)
        },
    );

    let err = engine.search("hello", 1).await.unwrap_err();
    assert!(
        matches!(err, SearchError::Embedding(EmbeddingError::Timeout(200))),
        "got {err:?}"
    );
    assert!(!store.scanned());
    drop(listener);
}
