//! Sentence segmentation for raw context text.

/// Fragments at or below this many characters are discarded.
pub const MIN_SENTENCE_CHARS: usize = 10;

/// A candidate sentence taken from the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// Trimmed sentence text, terminal punctuation included.
    pub text: String,
    /// Zero-based position among the retained sentences.
    pub position: usize,
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split context text into sentences.
///
/// Boundaries sit on the whitespace following `.`, `!` or `?`, so punctuation stays attached to
/// the sentence it ends. Fragments of [`MIN_SENTENCE_CHARS`] characters or fewer are dropped.
pub fn segment(text: &str) -> Vec<Sentence> {
    let normalized = normalize_whitespace(text);
    split_after_terminators(&normalized)
        .into_iter()
        .map(str::trim)
        .filter(|fragment| fragment.chars().count() > MIN_SENTENCE_CHARS)
        .enumerate()
        .map(|(position, fragment)| Sentence {
            text: fragment.to_string(),
            position,
        })
        .collect()
}

fn split_after_terminators(text: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut start = 0;
    let mut previous = None;

    for (idx, c) in text.char_indices() {
        if c == ' ' && matches!(previous, Some('.' | '!' | '?')) {
            fragments.push(&text[start..idx]);
            start = idx + c.len_utf8();
        }
        previous = Some(c);
    }

    if start < text.len() {
        fragments.push(&text[start..]);
    }

    fragments
}
