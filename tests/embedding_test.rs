mod helpers;

use helpers::LogCapture;
use vecmind::config::EmbeddingConfig;
use vecmind::embedding::hashed::hashed_embedding;
use vecmind::embedding::Embedder;

/// A local port with nothing listening on it.
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn remote_failure_warns_once_and_falls_back() {
    let embedder = Embedder::from_config(&EmbeddingConfig {
        api_key: Some("sk-test".into()),
        base_url: format!("http://127.0.0.1:{}/v1", closed_port()),
        dimensions: 8,
        remote_timeout_secs: 2,
        ..EmbeddingConfig::default()
    })
    .unwrap();

    let logs = LogCapture::default();
    let _guard = logs.install();

    let vector = embedder.embed("offline text").await;

    assert_eq!(vector, hashed_embedding("offline text", 8));
    assert_eq!(logs.warning_count(), 1, "{}", logs.contents());
    assert_eq!(logs.warnings("remote embedding failed"), 1);
}

#[tokio::test]
async fn missing_key_falls_back_silently() {
    let logs = LogCapture::default();
    let _guard = logs.install();

    let embedder = Embedder::from_config(&EmbeddingConfig {
        api_key: None,
        dimensions: 8,
        ..EmbeddingConfig::default()
    })
    .unwrap();
    let vector = embedder.embed("no key").await;

    assert_eq!(vector, hashed_embedding("no key", 8));
    assert_eq!(logs.warning_count(), 0, "{}", logs.contents());
}

#[tokio::test]
async fn fallback_only_embedder_never_warns() {
    let logs = LogCapture::default();
    let _guard = logs.install();

    let embedder = Embedder::fallback_only(16);
    for text in ["one", "two\nlines", ""] {
        assert_eq!(embedder.embed(text).await.len(), 16);
    }

    assert_eq!(logs.warning_count(), 0, "{}", logs.contents());
}
