//! Question classification and key-term extraction.

use serde::Serialize;
use std::fmt;

/// Words ignored when extracting key terms from a question.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "will",
    "would", "could", "should", "may", "might", "can", "what", "how", "why", "when", "where",
    "who",
];

/// Coarse question category driving scoring bonuses and answer templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    /// Definition questions ("what is", "define").
    What,
    /// Process questions ("how", "steps").
    How,
    /// Causal questions.
    Why,
    /// Temporal questions.
    When,
    /// Location questions.
    Where,
    /// Questions about people or agents.
    Who,
    /// Anything else, including comparisons.
    General,
}

impl QuestionType {
    /// Lowercase label used in logs and API payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::What => "what",
            Self::How => "how",
            Self::Why => "why",
            Self::When => "when",
            Self::Where => "where",
            Self::Who => "who",
            Self::General => "general",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionAnalysis {
    /// Detected question category.
    pub question_type: QuestionType,
    /// Whether the question asks for a definition.
    pub is_definition: bool,
    /// Whether the question asks for a process or sequence of steps.
    pub is_process: bool,
    /// Whether the question compares two or more things.
    pub is_comparison: bool,
}

impl QuestionAnalysis {
    const fn plain(question_type: QuestionType) -> Self {
        Self {
            question_type,
            is_definition: false,
            is_process: false,
            is_comparison: false,
        }
    }
}

/// Classify a question by phrase membership.
///
/// Checks run in a fixed order and the first matching group wins, so "how ... why" resolves to
/// [`QuestionType::How`].
pub fn classify_question(question: &str) -> QuestionAnalysis {
    let lower = question.to_lowercase();
    let contains_any = |phrases: &[&str]| phrases.iter().any(|phrase| lower.contains(phrase));

    if contains_any(&["what is", "what are", "define"]) {
        return QuestionAnalysis {
            is_definition: true,
            ..QuestionAnalysis::plain(QuestionType::What)
        };
    }
    if contains_any(&["how", "process", "steps"]) {
        return QuestionAnalysis {
            is_process: true,
            ..QuestionAnalysis::plain(QuestionType::How)
        };
    }
    if lower.contains("why") {
        return QuestionAnalysis::plain(QuestionType::Why);
    }
    if lower.contains("when") {
        return QuestionAnalysis::plain(QuestionType::When);
    }
    if lower.contains("where") {
        return QuestionAnalysis::plain(QuestionType::Where);
    }
    if lower.contains("who") {
        return QuestionAnalysis::plain(QuestionType::Who);
    }
    if contains_any(&["compare", "difference", "versus"]) {
        return QuestionAnalysis {
            is_comparison: true,
            ..QuestionAnalysis::plain(QuestionType::General)
        };
    }

    QuestionAnalysis::plain(QuestionType::General)
}

/// Extract lowercase content words from a question.
///
/// Punctuation is trimmed from token edges so "France?" yields `france`. Order and duplicates
/// are preserved.
pub fn extract_key_terms(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| word.chars().count() > 2 && !STOP_WORDS.contains(word))
        .map(str::to_string)
        .collect()
}
