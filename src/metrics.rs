use std::sync::atomic::{AtomicU64, Ordering};

/// How a question ended up being answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    /// A hosted QA model produced the answer.
    Hosted,
    /// The local extraction pipeline produced the answer.
    Local,
    /// No context was available; a fixed message was returned.
    NoContext,
}

/// Thread-safe counters describing answering activity.
#[derive(Default)]
pub struct AnswerMetrics {
    questions_answered: AtomicU64,
    hosted_answers: AtomicU64,
    local_answers: AtomicU64,
    embeddings_generated: AtomicU64,
}

impl AnswerMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answered question and where its answer came from.
    pub fn record_answer(&self, source: AnswerSource) {
        self.questions_answered.fetch_add(1, Ordering::Relaxed);
        match source {
            AnswerSource::Hosted => {
                self.hosted_answers.fetch_add(1, Ordering::Relaxed);
            }
            AnswerSource::Local => {
                self.local_answers.fetch_add(1, Ordering::Relaxed);
            }
            AnswerSource::NoContext => {}
        }
    }

    /// Record embeddings produced for a request.
    pub fn record_embeddings(&self, count: u64) {
        self.embeddings_generated.fetch_add(count, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            questions_answered: self.questions_answered.load(Ordering::Relaxed),
            hosted_answers: self.hosted_answers.load(Ordering::Relaxed),
            local_answers: self.local_answers.load(Ordering::Relaxed),
            embeddings_generated: self.embeddings_generated.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of answering counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Questions answered since startup, whatever the source.
    pub questions_answered: u64,
    /// Answers produced by a hosted QA model.
    pub hosted_answers: u64,
    /// Answers produced by the local extraction pipeline.
    pub local_answers: u64,
    /// Embedding vectors generated since startup.
    pub embeddings_generated: u64,
}
