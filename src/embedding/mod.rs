//! Embedding clients: a remote embedding service with a deterministic hash fallback.

pub mod hash;

pub use hash::{
    EMBEDDING_DIMENSION, Embedding, EmbeddingStrategy, generate_embedding, generate_embeddings,
};

use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Texts sent to the remote service per request.
const REMOTE_BATCH_SIZE: usize = 10;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// Every supplied text was empty or whitespace.
    #[error("No valid text chunks found")]
    NoValidTexts,
    /// Provider was unable to produce embeddings for the supplied input.
    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce an embedding vector for each supplied chunk of text, in order.
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Embedding>, EmbeddingClientError>;

    /// Short backend label used in logs and responses.
    fn name(&self) -> &'static str;
}

fn ensure_valid_texts(texts: &[String]) -> Result<(), EmbeddingClientError> {
    if texts.iter().any(|text| !text.trim().is_empty()) {
        Ok(())
    } else {
        Err(EmbeddingClientError::NoValidTexts)
    }
}

/// Deterministic embedding client backed by the hash strategies.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashEmbeddingClient {
    strategy: EmbeddingStrategy,
}

impl HashEmbeddingClient {
    /// Construct a hash client using the given strategy.
    pub const fn new(strategy: EmbeddingStrategy) -> Self {
        Self { strategy }
    }

    /// Strategy applied to every text.
    pub const fn strategy(&self) -> EmbeddingStrategy {
        self.strategy
    }
}

#[async_trait]
impl EmbeddingClient for HashEmbeddingClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Embedding>, EmbeddingClientError> {
        ensure_valid_texts(&texts)?;
        tracing::debug!(
            strategy = %self.strategy,
            count = texts.len(),
            "Generating hash embeddings"
        );
        Ok(generate_embeddings(&texts, self.strategy))
    }

    fn name(&self) -> &'static str {
        match self.strategy {
            EmbeddingStrategy::Word => "hash-word",
            EmbeddingStrategy::Char => "hash-char",
        }
    }
}

/// Client for an HTTP embedding service that answers `{"texts": [...]}` with
/// `{"embeddings": [[...]]}`.
///
/// Texts are sent in batches of ten. A batch that fails for any reason is embedded locally with
/// the fallback strategy instead, so one bad batch never fails the whole request.
pub struct RemoteEmbeddingClient {
    http: Client,
    endpoint: String,
    fallback: HashEmbeddingClient,
}

#[derive(Debug, Deserialize)]
struct RemoteEmbeddingResponse {
    #[serde(default)]
    embeddings: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    error: Option<String>,
}

impl RemoteEmbeddingClient {
    /// Build a client for `endpoint` with a request timeout.
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        fallback: EmbeddingStrategy,
    ) -> Result<Self, EmbeddingClientError> {
        let http = Client::builder()
            .user_agent("docqa/embeddings")
            .timeout(timeout)
            .build()
            .map_err(|error| {
                EmbeddingClientError::GenerationFailed(format!(
                    "failed to construct HTTP client: {error}"
                ))
            })?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            fallback: HashEmbeddingClient::new(fallback),
        })
    }

    async fn request_batch(&self, batch: &[String]) -> Result<Vec<Embedding>, EmbeddingClientError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "texts": batch }))
            .send()
            .await
            .map_err(|error| {
                EmbeddingClientError::GenerationFailed(format!(
                    "failed to reach embedding service at {}: {error}",
                    self.endpoint
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingClientError::GenerationFailed(format!(
                "embedding service returned {status}: {body}"
            )));
        }

        let body: RemoteEmbeddingResponse = response.json().await.map_err(|error| {
            EmbeddingClientError::GenerationFailed(format!(
                "failed to decode embedding response: {error}"
            ))
        })?;

        if let Some(error) = body.error {
            return Err(EmbeddingClientError::GenerationFailed(error));
        }

        let embeddings = body.embeddings.unwrap_or_default();
        if embeddings.len() != batch.len() {
            return Err(EmbeddingClientError::GenerationFailed(format!(
                "expected {} embeddings, got {}",
                batch.len(),
                embeddings.len()
            )));
        }
        if let Some(bad) = embeddings.iter().find(|v| v.len() != EMBEDDING_DIMENSION) {
            return Err(EmbeddingClientError::GenerationFailed(format!(
                "expected {EMBEDDING_DIMENSION} dimensions, got {}",
                bad.len()
            )));
        }

        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingClient for RemoteEmbeddingClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Embedding>, EmbeddingClientError> {
        ensure_valid_texts(&texts)?;
        let mut embeddings = Vec::with_capacity(texts.len());

        for (index, batch) in texts.chunks(REMOTE_BATCH_SIZE).enumerate() {
            match self.request_batch(batch).await {
                Ok(vectors) => embeddings.extend(vectors),
                Err(error) => {
                    tracing::warn!(
                        batch = index + 1,
                        size = batch.len(),
                        strategy = %self.fallback.strategy(),
                        error = %error,
                        "Embedding batch failed; using hash embeddings"
                    );
                    embeddings.extend(generate_embeddings(batch, self.fallback.strategy()));
                }
            }
        }

        Ok(embeddings)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

/// Build an embedding client suitable for the current configuration.
pub fn get_embedding_client(config: &Config) -> Box<dyn EmbeddingClient> {
    let fallback = HashEmbeddingClient::new(config.embedding_strategy);
    let Some(endpoint) = config.embedding_service_url.as_deref() else {
        return Box::new(fallback);
    };

    match RemoteEmbeddingClient::new(
        endpoint,
        Duration::from_secs(config.http_timeout_secs),
        config.embedding_strategy,
    ) {
        Ok(client) => Box::new(client),
        Err(error) => {
            tracing::warn!(error = %error, "Remote embedding client unavailable; using hash client");
            Box::new(fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn unit_vector() -> Vec<f32> {
        let mut vector = vec![0.0_f32; EMBEDDING_DIMENSION];
        vector[0] = 1.0;
        vector
    }

    fn texts(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("chunk number {i}")).collect()
    }

    fn remote(server: &MockServer) -> RemoteEmbeddingClient {
        RemoteEmbeddingClient::new(
            server.url("/embed"),
            Duration::from_secs(5),
            EmbeddingStrategy::Word,
        )
        .expect("client")
    }

    #[tokio::test]
    async fn hash_client_embeds_in_order() {
        let client = HashEmbeddingClient::new(EmbeddingStrategy::Char);
        let input = vec!["alpha".to_string(), "beta".to_string()];
        let vectors = client.generate_embeddings(input).await.expect("vectors");

        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], generate_embedding("alpha", EmbeddingStrategy::Char));
        assert_eq!(vectors[1], generate_embedding("beta", EmbeddingStrategy::Char));
        assert_eq!(client.name(), "hash-char");
    }

    #[tokio::test]
    async fn blank_input_is_rejected() {
        let client = HashEmbeddingClient::default();
        let error = client
            .generate_embeddings(vec!["  ".into(), String::new()])
            .await
            .expect_err("blank input");
        assert!(matches!(error, EmbeddingClientError::NoValidTexts));

        let error = client.generate_embeddings(Vec::new()).await.expect_err("empty");
        assert!(matches!(error, EmbeddingClientError::NoValidTexts));
    }

    #[tokio::test]
    async fn remote_client_uses_service_vectors() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/embed");
                then.status(200)
                    .json_body(json!({ "embeddings": [unit_vector(), unit_vector()] }));
            })
            .await;

        let vectors = remote(&server)
            .generate_embeddings(texts(2))
            .await
            .expect("vectors");

        mock.assert_async().await;
        assert_eq!(vectors, vec![unit_vector(), unit_vector()]);
    }

    #[tokio::test]
    async fn remote_client_batches_and_falls_back_per_batch() {
        let server = MockServer::start_async().await;
        let ten: Vec<Vec<f32>> = (0..REMOTE_BATCH_SIZE).map(|_| unit_vector()).collect();
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/embed");
                then.status(200).json_body(json!({ "embeddings": ten }));
            })
            .await;

        let input = texts(12);
        let vectors = remote(&server)
            .generate_embeddings(input.clone())
            .await
            .expect("vectors");

        mock.assert_hits_async(2).await;
        assert_eq!(vectors.len(), 12);
        assert!(vectors[..10].iter().all(|v| *v == unit_vector()));
        // The second batch of two received ten vectors and was replaced locally.
        assert_eq!(vectors[10], generate_embedding(&input[10], EmbeddingStrategy::Word));
        assert_eq!(vectors[11], generate_embedding(&input[11], EmbeddingStrategy::Word));
    }

    #[tokio::test]
    async fn remote_client_falls_back_on_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embed");
                then.status(500).body("model offline");
            })
            .await;

        let input = texts(3);
        let vectors = remote(&server)
            .generate_embeddings(input.clone())
            .await
            .expect("fallback vectors");

        assert_eq!(vectors, generate_embeddings(&input, EmbeddingStrategy::Word));
    }

    #[tokio::test]
    async fn remote_client_rejects_wrong_dimensions() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/embed");
                then.status(200).json_body(json!({ "embeddings": [[0.1, 0.2, 0.3]] }));
            })
            .await;

        let client = remote(&server);
        let error = client
            .request_batch(&texts(1))
            .await
            .expect_err("dimension mismatch");
        assert!(error.to_string().contains("384"));
    }

    #[test]
    fn client_selection_follows_config() {
        let config = Config::default();
        assert_eq!(get_embedding_client(&config).name(), "hash-word");

        let config = Config {
            embedding_service_url: Some("http://127.0.0.1:9/embed".into()),
            ..Config::default()
        };
        assert_eq!(get_embedding_client(&config).name(), "remote");
    }
}
