//! Keyword-overlap answerer.
//!
//! A cheaper cascade than the scored composers: rank raw fragments by how often question words
//! occur in them, and when nothing matches fall back to plain keyword containment and finally to
//! the opening fragments of the context.

use super::compose::{EMPTY_CONTEXT_MESSAGE, NO_SENTENCES_MESSAGE};

const RANKED_FRAGMENTS: usize = 2;
const MATCHED_FRAGMENTS: usize = 3;
const LEADING_FRAGMENTS: usize = 2;

/// Answer by term-frequency ranking, falling back to [`keyword_answer`].
pub fn term_frequency_answer(question: &str, context: &str) -> String {
    if context.trim().is_empty() {
        return EMPTY_CONTEXT_MESSAGE.to_string();
    }

    let words = question_words(question, 2);
    let mut ranked: Vec<(&str, usize)> = fragments(context)
        .into_iter()
        .filter_map(|fragment| {
            let lower = fragment.to_lowercase();
            let hits: usize = words
                .iter()
                .map(|word| lower.matches(word.as_str()).count())
                .sum();
            (hits > 0).then_some((fragment, hits))
        })
        .collect();

    if ranked.is_empty() {
        return keyword_answer(question, context);
    }

    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let top: Vec<&str> = ranked
        .into_iter()
        .take(RANKED_FRAGMENTS)
        .map(|(fragment, _)| fragment)
        .collect();
    render(&top)
}

/// Answer with the lowercase fragments that contain any longer question word.
pub fn keyword_answer(question: &str, context: &str) -> String {
    if context.trim().is_empty() {
        return EMPTY_CONTEXT_MESSAGE.to_string();
    }

    let lower_context = context.to_lowercase();
    let all = fragments(&lower_context);
    if all.is_empty() {
        return NO_SENTENCES_MESSAGE.to_string();
    }

    let words = question_words(question, 3);
    let relevant: Vec<&str> = all
        .iter()
        .copied()
        .filter(|fragment| words.iter().any(|word| fragment.contains(word.as_str())))
        .take(MATCHED_FRAGMENTS)
        .collect();

    if relevant.is_empty() {
        let leading: Vec<&str> = all.into_iter().take(LEADING_FRAGMENTS).collect();
        return render(&leading);
    }

    render(&relevant)
}

fn question_words(question: &str, min_exclusive: usize) -> Vec<String> {
    question
        .to_lowercase()
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| word.chars().count() > min_exclusive)
        .map(str::to_string)
        .collect()
}

fn fragments(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

fn render(fragments: &[&str]) -> String {
    let mut joined = fragments.join(". ");
    joined.push('.');
    capitalize_first(&joined)
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
