//! OpenAI-compatible remote embedding client.
//!
//! Sends `POST {base_url}/embeddings` with `{"model", "input"}` and reads the
//! first entry of the `data` array. Every failure mode is reported as a
//! [`RemoteError`] so the caller can decide to fall back.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;

/// Why a remote embedding request produced no usable vector.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("rate limited by embedding provider (HTTP 429)")]
    RateLimited,
    #[error("embedding provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("embedding request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("embedding response contained no vectors")]
    Empty,
    #[error("embedding response has {actual} dimensions, expected {expected}")]
    Dimension { expected: usize, actual: usize },
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// A configured client for one provider endpoint and model.
#[derive(Debug, Clone)]
pub struct RemoteEmbedder {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl RemoteEmbedder {
    pub fn new(config: &EmbeddingConfig, api_key: &str) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.remote_timeout_secs))
            .build()?;
        let endpoint = format!("{}/embeddings", config.base_url.trim_end_matches('/'));

        Ok(Self {
            http,
            endpoint,
            api_key: api_key.to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request one embedding. `text` is sent as-is.
    pub async fn create_embedding(&self, text: &str) -> Result<Vec<f32>, RemoteError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RemoteError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let parsed: EmbeddingResponse = response.json().await?;
        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(RemoteError::Empty)?;

        if embedding.len() != self.dimensions {
            return Err(RemoteError::Dimension {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }
        Ok(embedding)
    }
}
