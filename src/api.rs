//! HTTP surface for the document QA service.
//!
//! - `POST /generate-answer` – Answer a question from a supplied context with the local pipeline.
//! - `POST /generate-embeddings` – Embed a list of texts (hash strategy or configured service).
//! - `POST /ask` – Rank document chunks against a question and answer from the best ones.
//! - `GET /metrics` – Observe answering and embedding counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.

use crate::answer::ComposerKind;
use crate::embedding::{Embedding, EmbeddingClientError, EmbeddingStrategy};
use crate::metrics::MetricsSnapshot;
use crate::service::{AnswerApi, AnswerOutcome, ServiceError};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Build the HTTP router exposing the answering API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: AnswerApi + 'static,
{
    Router::new()
        .route("/generate-answer", post(generate_answer::<S>))
        .route("/generate-embeddings", post(generate_embeddings::<S>))
        .route("/ask", post(ask::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Request body for `POST /generate-answer`. Missing fields read as blank and are rejected with
/// 400 by the handler.
#[derive(Deserialize)]
struct GenerateAnswerRequest {
    #[serde(default)]
    question: String,
    #[serde(default)]
    context: String,
    /// Optional composer override (`template` | `plain` | `keyword` | `sentence`).
    #[serde(default)]
    composer: Option<ComposerKind>,
}

/// Response body shared by the answering endpoints.
#[derive(Serialize)]
struct AnswerResponse {
    answer: String,
    method: String,
    model: Option<String>,
}

async fn generate_answer<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<GenerateAnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError>
where
    S: AnswerApi,
{
    if request.question.trim().is_empty() || request.context.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Question and context are required".into(),
        ));
    }

    let outcome = service.answer_local(&request.question, &request.context, request.composer);
    tracing::info!(method = %outcome.method, "Generate-answer request completed");
    Ok(Json(AnswerResponse {
        answer: outcome.answer,
        method: outcome.method,
        model: outcome.model,
    }))
}

/// Request body for `POST /generate-embeddings`.
#[derive(Deserialize)]
struct GenerateEmbeddingsRequest {
    #[serde(default)]
    texts: Vec<String>,
    /// Force a hash strategy instead of the configured client.
    #[serde(default)]
    strategy: Option<EmbeddingStrategy>,
}

#[derive(Serialize)]
struct EmbeddingsResponse {
    embeddings: Vec<Embedding>,
}

async fn generate_embeddings<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<GenerateEmbeddingsRequest>,
) -> Result<Json<EmbeddingsResponse>, AppError>
where
    S: AnswerApi,
{
    if request.texts.is_empty() {
        return Err(AppError::BadRequest("Texts array is required".into()));
    }

    let count = request.texts.len();
    let embeddings = service.embed(request.texts, request.strategy).await?;
    tracing::info!(count, "Generate-embeddings request completed");
    Ok(Json(EmbeddingsResponse { embeddings }))
}

/// Request body for `POST /ask`.
#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: String,
    /// Document chunks to rank; blank entries are ignored.
    #[serde(default)]
    chunks: Vec<String>,
}

async fn ask<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AnswerOutcome>, AppError>
where
    S: AnswerApi,
{
    if request.question.trim().is_empty() {
        return Err(AppError::BadRequest("Question is required".into()));
    }

    let span = tracing::info_span!(
        "ask",
        request_id = %Uuid::new_v4(),
        chunks = request.chunks.len()
    );
    let outcome = async {
        let outcome = service.ask(&request.question, request.chunks).await;
        tracing::info!(
            method = %outcome.method,
            context_chunks = outcome.context_chunks,
            "Ask request completed"
        );
        outcome
    }
    .instrument(span)
    .await;
    Ok(Json(outcome))
}

/// Return a snapshot of answering counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: AnswerApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "generate_answer",
                method: "POST",
                path: "/generate-answer",
                description: "Extract an answer to a question from the supplied context without any network calls. Response returns { \"answer\", \"method\", \"model\" }.",
                request_example: Some(json!({
                    "question": "What is the capital of France?",
                    "context": "Paris is the capital of France. It is known for the Eiffel Tower.",
                    "composer": "template"
                })),
            },
            CommandDescriptor {
                name: "generate_embeddings",
                method: "POST",
                path: "/generate-embeddings",
                description: "Embed each text into a 384-dimension unit vector.",
                request_example: Some(json!({
                    "texts": ["first chunk", "second chunk"],
                    "strategy": "word"
                })),
            },
            CommandDescriptor {
                name: "ask",
                method: "POST",
                path: "/ask",
                description: "Rank document chunks against the question and answer from the most relevant ones, using a hosted model when configured.",
                request_example: Some(json!({
                    "question": "Who wrote the report?",
                    "chunks": ["The report was written by the audit team.", "Appendix A lists figures."]
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return answering and embedding counters.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    BadRequest(String),
    Service(ServiceError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Service(ServiceError::Embedding(EmbeddingClientError::NoValidTexts)) => (
                StatusCode::BAD_REQUEST,
                EmbeddingClientError::NoValidTexts.to_string(),
            ),
            Self::Service(error) => {
                tracing::error!(error = %error, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(inner: ServiceError) -> Self {
        Self::Service(inner)
    }
}
