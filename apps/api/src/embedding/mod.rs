//! Embedding client: turns text into a fixed-length vector via the external
//! embedding service.
//!
//! The client performs no retries. Remote failures surface as
//! `EmbeddingError` and the caller decides whether to back off and retry.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod source;

pub use source::EmbeddingSource;

/// A dense embedding. Dimension is defined by the remote model and never
/// inspected here.
pub type Embedding = Vec<f32>;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding input must not be empty: {0}")]
    InvalidInput(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed embedding payload: {0}")]
    MalformedPayload(String),
}

/// Anything that can embed a single text.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// HTTP client for the embedding service (`POST {base_url}/embed`).
#[derive(Clone)]
pub struct HttpEmbeddingClient {
    client: Client,
    base_url: String,
}

impl HttpEmbeddingClient {
    pub fn new(base_url: &str, timeout: std::time::Duration) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        ensure_non_empty(text)?;

        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&EmbedRequest { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        let parsed: EmbedResponse = serde_json::from_slice(&body)
            .map_err(|e| EmbeddingError::MalformedPayload(e.to_string()))?;
        if parsed.embedding.is_empty() {
            return Err(EmbeddingError::MalformedPayload(
                "service returned an empty vector".to_string(),
            ));
        }

        debug!("Embedded {} chars into {} dims", text.len(), parsed.embedding.len());
        Ok(parsed.embedding)
    }
}

/// Rejects empty or whitespace-only input before any network call.
pub fn ensure_non_empty(text: &str) -> Result<(), EmbeddingError> {
    if text.trim().is_empty() {
        return Err(EmbeddingError::InvalidInput(
            "text is empty or whitespace".to_string(),
        ));
    }
    Ok(())
}
