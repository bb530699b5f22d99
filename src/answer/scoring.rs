//! Heuristic sentence scoring against a question's key terms and type.

use super::question::QuestionAnalysis;
use super::segment::Sentence;

/// Weights applied by a scoring pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringProfile {
    /// Points added per occurrence of a key term.
    pub term_weight: f64,
    /// Whether question-type, position, and length bonuses apply.
    pub structural_bonuses: bool,
}

impl ScoringProfile {
    /// Profile used by the plain composer: term weight 2 plus all bonuses.
    pub const PLAIN: Self = Self {
        term_weight: 2.0,
        structural_bonuses: true,
    };

    /// Profile used by the template composer: term weight 3, term matches only.
    pub const TEMPLATE: Self = Self {
        term_weight: 3.0,
        structural_bonuses: false,
    };
}

/// A sentence annotated with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSentence {
    /// Sentence text as segmented.
    pub text: String,
    /// Position of the sentence in the context.
    pub position: usize,
    /// Sum of all scoring components.
    pub score: f64,
    /// Fraction of key terms found at least once, in `0.0..=1.0`.
    pub relevance: f64,
}

/// Score every sentence for the given question.
pub fn score(
    sentences: &[Sentence],
    analysis: &QuestionAnalysis,
    key_terms: &[String],
    profile: ScoringProfile,
) -> Vec<ScoredSentence> {
    let sentence_count = sentences.len();

    sentences
        .iter()
        .map(|sentence| {
            let lower = sentence.text.to_lowercase();
            let (term_score, matched) = term_frequency(&lower, key_terms, profile.term_weight);
            let mut score = term_score;

            if profile.structural_bonuses {
                score += question_type_bonus(&lower, analysis);
                score += position_bonus(sentence.position, sentence_count, analysis);
                score += length_bonus(sentence.text.chars().count());
            }

            let relevance = if key_terms.is_empty() {
                0.0
            } else {
                matched as f64 / key_terms.len() as f64
            };

            ScoredSentence {
                text: sentence.text.clone(),
                position: sentence.position,
                score,
                relevance,
            }
        })
        .collect()
}

/// Count literal occurrences of each key term, returning the weighted score and the number of
/// terms matched at least once.
fn term_frequency(lower_sentence: &str, key_terms: &[String], weight: f64) -> (f64, usize) {
    key_terms
        .iter()
        .filter(|term| !term.is_empty())
        .fold((0.0, 0), |(score, matched), term| {
            let count = lower_sentence.matches(term.as_str()).count();
            if count > 0 {
                (score + count as f64 * weight, matched + 1)
            } else {
                (score, matched)
            }
        })
}

fn question_type_bonus(lower_sentence: &str, analysis: &QuestionAnalysis) -> f64 {
    let contains_any = |phrases: &[&str]| phrases.iter().any(|p| lower_sentence.contains(p));
    let mut bonus = 0.0;

    if analysis.is_definition {
        if contains_any(&["is", "are", "refers to"]) {
            bonus += 3.0;
        }
        if contains_any(&["definition", "means", "consists of"]) {
            bonus += 5.0;
        }
    }

    if analysis.is_process {
        if contains_any(&["step", "process", "procedure"]) {
            bonus += 3.0;
        }
        if contains_any(&["first", "then", "finally"]) {
            bonus += 2.0;
        }
    }

    bonus
}

fn position_bonus(position: usize, sentence_count: usize, analysis: &QuestionAnalysis) -> f64 {
    let position = position as f64;
    if analysis.is_definition {
        (10.0 - position).max(0.0)
    } else {
        let middle = sentence_count as f64 / 2.0;
        (5.0 - (position - middle).abs()).max(0.0)
    }
}

fn length_bonus(chars: usize) -> f64 {
    (10.0 - (chars as f64 - 100.0).abs()).max(0.0)
}
