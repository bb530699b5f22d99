use crate::answer::ComposerKind;
use crate::embedding::EmbeddingStrategy;
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_RETRIEVAL_TOP_K: usize = 20;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the answering service.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Hash strategy used whenever a local embedding is produced.
    pub embedding_strategy: EmbeddingStrategy,
    /// Optional remote embedding endpoint accepting `{"texts": [...]}`.
    pub embedding_service_url: Option<String>,
    /// Local composer used when no hosted QA model answers.
    pub answer_composer: ComposerKind,
    /// Hosted QA model endpoints, tried in order.
    pub qa_model_urls: Vec<String>,
    /// Optional bearer token sent to hosted QA models.
    pub qa_api_key: Option<String>,
    /// Number of retrieved chunks concatenated into the answer context.
    pub retrieval_top_k: usize,
    /// Timeout applied to outbound HTTP requests, in seconds.
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: None,
            embedding_strategy: EmbeddingStrategy::default(),
            embedding_service_url: None,
            answer_composer: ComposerKind::default(),
            qa_model_urls: Vec::new(),
            qa_api_key: None,
            retrieval_top_k: DEFAULT_RETRIEVAL_TOP_K,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let load = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            server_port: parse_optional(load("SERVER_PORT"), "SERVER_PORT")?,
            embedding_strategy: load("EMBEDDING_STRATEGY")
                .map(|value| {
                    value
                        .parse::<EmbeddingStrategy>()
                        .map_err(|()| ConfigError::InvalidValue("EMBEDDING_STRATEGY".into()))
                })
                .transpose()?
                .unwrap_or(defaults.embedding_strategy),
            embedding_service_url: load("EMBEDDING_SERVICE_URL").map(|url| url.trim().to_string()),
            answer_composer: load("ANSWER_COMPOSER")
                .map(|value| {
                    value
                        .parse::<ComposerKind>()
                        .map_err(|()| ConfigError::InvalidValue("ANSWER_COMPOSER".into()))
                })
                .transpose()?
                .unwrap_or(defaults.answer_composer),
            qa_model_urls: load("QA_MODEL_URLS")
                .map(|value| split_list(&value))
                .unwrap_or_default(),
            qa_api_key: load("QA_API_KEY"),
            retrieval_top_k: parse_optional::<usize>(load("RETRIEVAL_TOP_K"), "RETRIEVAL_TOP_K")?
                .filter(|top_k| *top_k > 0)
                .unwrap_or(defaults.retrieval_top_k),
            http_timeout_secs: parse_optional::<u64>(
                load("HTTP_TIMEOUT_SECS"),
                "HTTP_TIMEOUT_SECS",
            )?
            .unwrap_or(defaults.http_timeout_secs),
        })
    }
}

fn parse_optional<T: std::str::FromStr>(
    value: Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        server_port = ?config.server_port,
        embedding_strategy = %config.embedding_strategy,
        embedding_service = ?config.embedding_service_url,
        composer = %config.answer_composer,
        qa_models = config.qa_model_urls.len(),
        top_k = config.retrieval_top_k,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
