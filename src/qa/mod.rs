//! Clients for hosted extractive question-answering models.
//!
//! Hosted models are optional. When none is configured, or every configured model fails, the
//! answer service falls back to the local extraction pipeline in [`crate::answer`].

use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced while querying hosted QA models.
#[derive(Debug, Error)]
pub enum QaClientError {
    /// The HTTP client could not be constructed.
    #[error("QA client unavailable: {0}")]
    Unavailable(String),
    /// A model answered with an explicit error payload.
    #[error("QA model reported an error: {0}")]
    Provider(String),
    /// A model answered with a payload that carries no answer.
    #[error("Malformed QA response: {0}")]
    InvalidResponse(String),
    /// No configured model produced a usable response.
    #[error("All {attempted} QA models failed")]
    AllModelsFailed {
        /// Number of model endpoints attempted.
        attempted: usize,
    },
}

/// Answer returned by a hosted model.
#[derive(Debug, Clone, PartialEq)]
pub struct QaAnswer {
    /// Answer text.
    pub answer: String,
    /// Endpoint of the model that answered.
    pub model: String,
}

/// Interface implemented by hosted QA backends.
#[async_trait]
pub trait QaClient: Send + Sync {
    /// Answer `question` using `context`.
    async fn answer(&self, question: &str, context: &str) -> Result<QaAnswer, QaClientError>;
}

/// Build a QA client when at least one model endpoint is configured.
pub fn get_qa_client(config: &Config) -> Option<Box<dyn QaClient>> {
    if config.qa_model_urls.is_empty() {
        return None;
    }

    match HostedQaClient::new(
        config.qa_model_urls.clone(),
        config.qa_api_key.clone(),
        Duration::from_secs(config.http_timeout_secs),
    ) {
        Ok(client) => Some(Box::new(client)),
        Err(error) => {
            tracing::warn!(error = %error, "Hosted QA client unavailable; answering locally");
            None
        }
    }
}

/// Client that tries a list of hosted inference endpoints in order.
pub struct HostedQaClient {
    http: Client,
    models: Vec<String>,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

/// Outcome of querying a single model. Only `Unreachable` moves on to the next model.
enum Attempt {
    Answered(String),
    Rejected(QaClientError),
    Unreachable(String),
}

impl HostedQaClient {
    /// Construct a client for the given model endpoints.
    pub fn new(
        models: Vec<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, QaClientError> {
        let http = Client::builder()
            .user_agent("docqa/qa")
            .timeout(timeout)
            .build()
            .map_err(|error| QaClientError::Unavailable(error.to_string()))?;
        Ok(Self {
            http,
            models,
            api_key,
        })
    }

    fn prompt(question: &str, context: &str) -> String {
        format!("Context: {context}\n\nQuestion: {question}\n\nAnswer:")
    }

    async fn query_model(&self, model: &str, question: &str, context: &str) -> Attempt {
        let payload = json!({
            "inputs": Self::prompt(question, context),
            "parameters": {
                "max_length": 150,
                "min_length": 20,
                "do_sample": true,
                "temperature": 0.7,
                "top_p": 0.9,
            }
        });

        let mut request = self.http.post(model).json(&payload);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => return Attempt::Unreachable(error.to_string()),
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Attempt::Unreachable(format!("{status} - {body}"));
        }

        let body = match response.json::<Value>().await {
            Ok(body) => body,
            Err(error) => {
                return Attempt::Unreachable(format!("response body is not JSON: {error}"));
            }
        };

        match serde_json::from_value::<ModelResponse>(body) {
            Ok(ModelResponse {
                answer: Some(answer),
                ..
            }) if !answer.trim().is_empty() => Attempt::Answered(answer.trim().to_string()),
            Ok(ModelResponse {
                error: Some(error), ..
            }) => Attempt::Rejected(QaClientError::Provider(describe_error(&error))),
            Ok(_) => Attempt::Rejected(QaClientError::InvalidResponse(
                "response carried no answer".into(),
            )),
            Err(error) => Attempt::Rejected(QaClientError::InvalidResponse(error.to_string())),
        }
    }
}

fn describe_error(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl QaClient for HostedQaClient {
    async fn answer(&self, question: &str, context: &str) -> Result<QaAnswer, QaClientError> {
        for model in &self.models {
            match self.query_model(model, question, context).await {
                Attempt::Answered(answer) => {
                    tracing::debug!(model = %model, "Hosted QA model answered");
                    return Ok(QaAnswer {
                        answer,
                        model: model.clone(),
                    });
                }
                Attempt::Rejected(error) => {
                    tracing::warn!(model = %model, error = %error, "Hosted QA model returned no answer");
                    return Err(error);
                }
                Attempt::Unreachable(reason) => {
                    tracing::warn!(model = %model, reason = %reason, "Hosted QA model failed; trying next");
                }
            }
        }

        Err(QaClientError::AllModelsFailed {
            attempted: self.models.len(),
        })
    }
}
