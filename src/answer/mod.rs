//! Local answer extraction: the last-resort path when no hosted QA model answers.
//!
//! The pipeline runs question analysis, sentence segmentation, scoring, selection, and
//! composition in sequence. Every degenerate input resolves to a fixed message, so the entry
//! points never fail and always return displayable text.

pub mod compose;
pub mod keyword;
pub mod question;
pub mod scoring;
pub mod segment;

use serde::Deserialize;
use std::fmt;

pub use compose::{
    Composer, EMPTY_CONTEXT_MESSAGE, NO_MATCH_MESSAGE, NO_SENTENCES_MESSAGE, PlainComposer,
    TemplateComposer, best_sentence_answer,
};
pub use question::{QuestionAnalysis, QuestionType, classify_question, extract_key_terms};
pub use scoring::{ScoredSentence, ScoringProfile};
pub use segment::{Sentence, segment};

/// Local answering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposerKind {
    /// Template-prefixed answer from term-weighted sentences.
    #[default]
    Template,
    /// Bare answer from sentences scored with structural bonuses.
    Plain,
    /// Keyword-overlap cascade over raw fragments.
    #[serde(alias = "tfidf")]
    Keyword,
    /// Single best-matching sentence behind a short lead phrase.
    Sentence,
}

impl ComposerKind {
    /// Lowercase label used in configuration and responses.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Plain => "plain",
            Self::Keyword => "keyword",
            Self::Sentence => "sentence",
        }
    }
}

impl fmt::Display for ComposerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComposerKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "template" => Ok(Self::Template),
            "plain" => Ok(Self::Plain),
            "keyword" | "tfidf" => Ok(Self::Keyword),
            "sentence" => Ok(Self::Sentence),
            _ => Err(()),
        }
    }
}

/// Answer a question from context text with the default composer.
pub fn generate_answer(question: &str, context: &str) -> String {
    generate_answer_with(question, context, ComposerKind::default())
}

/// Answer a question from context text with the requested composer.
pub fn generate_answer_with(question: &str, context: &str, kind: ComposerKind) -> String {
    match kind {
        ComposerKind::Template => extract_answer(question, context, &TemplateComposer),
        ComposerKind::Plain => extract_answer(question, context, &PlainComposer),
        ComposerKind::Keyword => keyword::term_frequency_answer(question, context),
        ComposerKind::Sentence => compose::best_sentence_answer(question, context),
    }
}

/// Run the scored extraction pipeline with an arbitrary composer.
pub fn extract_answer(question: &str, context: &str, composer: &dyn Composer) -> String {
    if context.trim().is_empty() {
        return EMPTY_CONTEXT_MESSAGE.to_string();
    }

    let sentences = segment(context);
    if sentences.is_empty() {
        return NO_SENTENCES_MESSAGE.to_string();
    }

    let analysis = classify_question(question);
    let key_terms = extract_key_terms(question);
    let scored = scoring::score(&sentences, &analysis, &key_terms, composer.profile());
    let selected = compose::select(&scored, &analysis);

    tracing::debug!(
        question_type = %analysis.question_type,
        key_terms = key_terms.len(),
        sentences = sentences.len(),
        selected = selected.len(),
        "Scored context sentences"
    );

    if selected.is_empty() {
        return NO_MATCH_MESSAGE.to_string();
    }

    let answer = composer.compose(&selected, &analysis);
    if answer.trim().is_empty() {
        return NO_MATCH_MESSAGE.to_string();
    }
    answer
}
