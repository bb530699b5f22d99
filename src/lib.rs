#![deny(missing_docs)]

//! Core library for the document QA service: local answer extraction, hash embeddings, and an
//! optional hosted QA model in front of them.

/// Local answer extraction from a question and context.
pub mod answer;
/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and hash embeddings.
pub mod embedding;
/// Structured logging and tracing setup.
pub mod logging;
/// Answering metrics helpers.
pub mod metrics;
/// Hosted question-answering model clients.
pub mod qa;
/// Chunk ranking and context assembly.
pub mod retrieval;
/// Answer service orchestrating retrieval, hosted QA, and local fallback.
pub mod service;
