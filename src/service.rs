//! Answer service coordinating embedding, retrieval, hosted QA, and local fallback.

use crate::{
    answer::{ComposerKind, generate_answer_with},
    config::Config,
    embedding::{
        Embedding, EmbeddingClient, EmbeddingClientError, EmbeddingStrategy, generate_embeddings,
        get_embedding_client,
    },
    metrics::{AnswerMetrics, AnswerSource, MetricsSnapshot},
    qa::{QaClient, get_qa_client},
    retrieval::{EmbeddedChunk, build_context, rank_chunks},
};
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Returned by [`AnswerService::ask`] when no usable chunk was supplied.
pub const NO_RELEVANT_CONTEXT_MESSAGE: &str = "I couldn't find any relevant information in the document to answer your question. Please try rephrasing your question or make sure the document contains information related to your query.";

/// Errors emitted by the answer service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Embedding provider failed to produce vectors for the input text.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
}

/// Result of answering a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerOutcome {
    /// Answer text shown to the user.
    pub answer: String,
    /// How the answer was produced (`hosted`, `local-<composer>`, or `none`).
    pub method: String,
    /// Hosted model endpoint, when one answered.
    pub model: Option<String>,
    /// Number of chunks concatenated into the context.
    pub context_chunks: usize,
}

impl AnswerOutcome {
    fn local(answer: String, composer: ComposerKind, context_chunks: usize) -> Self {
        Self {
            answer,
            method: format!("local-{composer}"),
            model: None,
            context_chunks,
        }
    }
}

/// Abstraction over the answering pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait AnswerApi: Send + Sync {
    /// Retrieve relevant chunks for `question` and answer from them.
    async fn ask(&self, question: &str, chunks: Vec<String>) -> AnswerOutcome;

    /// Answer from an already assembled context using only the local pipeline.
    fn answer_local(
        &self,
        question: &str,
        context: &str,
        composer: Option<ComposerKind>,
    ) -> AnswerOutcome;

    /// Embed texts with an explicit hash strategy or the configured client.
    async fn embed(
        &self,
        texts: Vec<String>,
        strategy: Option<EmbeddingStrategy>,
    ) -> Result<Vec<Embedding>, ServiceError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Coordinates the answering pipeline.
///
/// Question and chunks are embedded together, chunks are ranked by cosine similarity, and the
/// best `top_k` form the context. A configured hosted QA model answers first; any failure drops
/// to the local composer, which always produces text.
pub struct AnswerService {
    embedding_client: Box<dyn EmbeddingClient>,
    qa_client: Option<Box<dyn QaClient>>,
    composer: ComposerKind,
    fallback_strategy: EmbeddingStrategy,
    top_k: usize,
    metrics: AnswerMetrics,
}

impl AnswerService {
    /// Build the service from configuration.
    pub fn new(config: &Config) -> Self {
        tracing::info!("Initializing answer service");
        let embedding_client = get_embedding_client(config);
        let qa_client = get_qa_client(config);
        tracing::info!(
            embeddings = embedding_client.name(),
            hosted_qa = qa_client.is_some(),
            composer = %config.answer_composer,
            top_k = config.retrieval_top_k,
            "Answer service initialized"
        );
        Self::from_parts(embedding_client, qa_client, config)
    }

    /// Build the service around explicit clients.
    pub fn from_parts(
        embedding_client: Box<dyn EmbeddingClient>,
        qa_client: Option<Box<dyn QaClient>>,
        config: &Config,
    ) -> Self {
        Self {
            embedding_client,
            qa_client,
            composer: config.answer_composer,
            fallback_strategy: config.embedding_strategy,
            top_k: config.retrieval_top_k.max(1),
            metrics: AnswerMetrics::new(),
        }
    }

    /// Retrieve relevant chunks for `question` and answer from them.
    pub async fn ask(&self, question: &str, chunks: Vec<String>) -> AnswerOutcome {
        let chunks: Vec<String> = chunks
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .collect();

        if chunks.is_empty() {
            tracing::info!("No context chunks supplied");
            self.metrics.record_answer(AnswerSource::NoContext);
            return AnswerOutcome {
                answer: NO_RELEVANT_CONTEXT_MESSAGE.to_string(),
                method: "none".into(),
                model: None,
                context_chunks: 0,
            };
        }

        let mut texts = Vec::with_capacity(chunks.len() + 1);
        texts.push(question.to_string());
        texts.extend(chunks.iter().cloned());
        let mut vectors = self.embed_or_hash(texts).await;
        let query = vectors.remove(0);

        let embedded: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(text, vector)| EmbeddedChunk { text, vector })
            .collect();
        let ranked = rank_chunks(&query, &embedded, self.top_k);
        tracing::debug!(
            candidates = embedded.len(),
            kept = ranked.len(),
            scores = ?ranked.iter().map(|chunk| chunk.score).collect::<Vec<_>>(),
            "Ranked context chunks"
        );

        let texts: Vec<&str> = ranked.iter().map(|chunk| chunk.text.as_str()).collect();
        let context = build_context(&texts);

        if let Some(qa_client) = &self.qa_client {
            match qa_client.answer(question, &context).await {
                Ok(hosted) => {
                    self.metrics.record_answer(AnswerSource::Hosted);
                    return AnswerOutcome {
                        answer: hosted.answer,
                        method: "hosted".into(),
                        model: Some(hosted.model),
                        context_chunks: ranked.len(),
                    };
                }
                Err(error) => {
                    tracing::warn!(
                        error = %error,
                        composer = %self.composer,
                        "Hosted QA failed; answering locally"
                    );
                }
            }
        }

        self.metrics.record_answer(AnswerSource::Local);
        AnswerOutcome::local(
            generate_answer_with(question, &context, self.composer),
            self.composer,
            ranked.len(),
        )
    }

    /// Answer from an already assembled context using only the local pipeline.
    pub fn answer_local(
        &self,
        question: &str,
        context: &str,
        composer: Option<ComposerKind>,
    ) -> AnswerOutcome {
        let composer = composer.unwrap_or(self.composer);
        self.metrics.record_answer(AnswerSource::Local);
        AnswerOutcome::local(generate_answer_with(question, context, composer), composer, 0)
    }

    /// Embed texts with an explicit hash strategy or the configured client.
    pub async fn embed(
        &self,
        texts: Vec<String>,
        strategy: Option<EmbeddingStrategy>,
    ) -> Result<Vec<Embedding>, ServiceError> {
        let vectors = match strategy {
            Some(strategy) => {
                if texts.iter().all(|text| text.trim().is_empty()) {
                    return Err(EmbeddingClientError::NoValidTexts.into());
                }
                generate_embeddings(&texts, strategy)
            }
            None => self.embedding_client.generate_embeddings(texts).await?,
        };
        self.metrics.record_embeddings(vectors.len() as u64);
        Ok(vectors)
    }

    /// Return the current answering metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn embed_or_hash(&self, texts: Vec<String>) -> Vec<Embedding> {
        let expected = texts.len();
        let vectors = match self.embedding_client.generate_embeddings(texts.clone()).await {
            Ok(vectors) if vectors.len() == expected => vectors,
            Ok(vectors) => {
                tracing::warn!(
                    expected,
                    actual = vectors.len(),
                    "Embedding count mismatch; using hash embeddings"
                );
                generate_embeddings(&texts, self.fallback_strategy)
            }
            Err(error) => {
                tracing::warn!(error = %error, "Embedding failed; using hash embeddings");
                generate_embeddings(&texts, self.fallback_strategy)
            }
        };
        self.metrics.record_embeddings(vectors.len() as u64);
        vectors
    }
}

#[async_trait]
impl AnswerApi for AnswerService {
    async fn ask(&self, question: &str, chunks: Vec<String>) -> AnswerOutcome {
        AnswerService::ask(self, question, chunks).await
    }

    fn answer_local(
        &self,
        question: &str,
        context: &str,
        composer: Option<ComposerKind>,
    ) -> AnswerOutcome {
        AnswerService::answer_local(self, question, context, composer)
    }

    async fn embed(
        &self,
        texts: Vec<String>,
        strategy: Option<EmbeddingStrategy>,
    ) -> Result<Vec<Embedding>, ServiceError> {
        AnswerService::embed(self, texts, strategy).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        AnswerService::metrics_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::NO_MATCH_MESSAGE;
    use crate::embedding::{EMBEDDING_DIMENSION, HashEmbeddingClient};
    use crate::qa::{QaAnswer, QaClientError};

    const PARIS: &str = "Paris is the capital of France. It has many museums.";
    const BANANAS: &str = "Bananas are yellow fruit grown in tropical regions.";

    struct FixedQa(Option<&'static str>);

    #[async_trait]
    impl QaClient for FixedQa {
        async fn answer(&self, _question: &str, _context: &str) -> Result<QaAnswer, QaClientError> {
            match self.0 {
                Some(answer) => Ok(QaAnswer {
                    answer: answer.into(),
                    model: "stub-model".into(),
                }),
                None => Err(QaClientError::AllModelsFailed { attempted: 1 }),
            }
        }
    }

    struct BrokenEmbeddings;

    #[async_trait]
    impl EmbeddingClient for BrokenEmbeddings {
        async fn generate_embeddings(
            &self,
            _texts: Vec<String>,
        ) -> Result<Vec<Embedding>, EmbeddingClientError> {
            Err(EmbeddingClientError::GenerationFailed("offline".into()))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn service(qa: Option<FixedQa>, top_k: usize) -> AnswerService {
        let config = Config {
            retrieval_top_k: top_k,
            ..Config::default()
        };
        AnswerService::from_parts(
            Box::new(HashEmbeddingClient::new(EmbeddingStrategy::Word)),
            qa.map(|client| Box::new(client) as Box<dyn QaClient>),
            &config,
        )
    }

    fn chunks() -> Vec<String> {
        vec![BANANAS.to_string(), PARIS.to_string()]
    }

    #[tokio::test]
    async fn ask_answers_locally_from_best_chunk() {
        let service = service(None, 1);
        let outcome = service.ask("What is the capital of France?", chunks()).await;

        assert_eq!(outcome.method, "local-template");
        assert_eq!(outcome.model, None);
        assert_eq!(outcome.context_chunks, 1);
        assert_eq!(outcome.answer, "Based on the document: Paris is the capital of France.");
    }

    #[tokio::test]
    async fn ask_prefers_hosted_answer() {
        let service = service(Some(FixedQa(Some("Paris"))), 20);
        let outcome = service.ask("What is the capital of France?", chunks()).await;

        assert_eq!(outcome.answer, "Paris");
        assert_eq!(outcome.method, "hosted");
        assert_eq!(outcome.model.as_deref(), Some("stub-model"));
        assert_eq!(outcome.context_chunks, 2);

        let snapshot = service.metrics_snapshot();
        assert_eq!(snapshot.hosted_answers, 1);
        assert_eq!(snapshot.embeddings_generated, 3);
    }

    #[tokio::test]
    async fn ask_falls_back_when_hosted_fails() {
        let service = service(Some(FixedQa(None)), 20);
        let outcome = service.ask("What is the capital of France?", chunks()).await;

        assert_eq!(outcome.method, "local-template");
        assert!(outcome.answer.contains("Paris is the capital of France"));
        assert_eq!(service.metrics_snapshot().local_answers, 1);
    }

    #[tokio::test]
    async fn ask_without_chunks_returns_fixed_message() {
        let service = service(Some(FixedQa(Some("unused"))), 20);
        let outcome = service.ask("Anything?", vec![String::new(), "  ".into()]).await;

        assert_eq!(outcome.answer, NO_RELEVANT_CONTEXT_MESSAGE);
        assert_eq!(outcome.method, "none");
        assert_eq!(outcome.context_chunks, 0);
        assert_eq!(service.metrics_snapshot().questions_answered, 1);
    }

    #[tokio::test]
    async fn ask_survives_embedding_failures() {
        let service = AnswerService::from_parts(Box::new(BrokenEmbeddings), None, &Config::default());
        let outcome = service.ask("Where do penguins live?", chunks()).await;

        assert_eq!(outcome.method, "local-template");
        assert_eq!(outcome.answer, NO_MATCH_MESSAGE);
    }

    #[tokio::test]
    async fn answer_local_honours_composer_override() {
        let service = service(None, 20);
        let outcome =
            service.answer_local("What is the capital of France?", PARIS, Some(ComposerKind::Plain));
        assert_eq!(outcome.method, "local-plain");
        assert_eq!(outcome.answer, "Paris is the capital of France It has many museums");
    }

    #[tokio::test]
    async fn embed_uses_requested_strategy() {
        let service = service(None, 20);
        let vectors = service
            .embed(vec!["hello world".into()], Some(EmbeddingStrategy::Char))
            .await
            .expect("vectors");
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].len(), EMBEDDING_DIMENSION);

        let error = service
            .embed(vec![" ".into()], Some(EmbeddingStrategy::Word))
            .await
            .expect_err("blank input");
        assert!(matches!(
            error,
            ServiceError::Embedding(EmbeddingClientError::NoValidTexts)
        ));
    }
}
