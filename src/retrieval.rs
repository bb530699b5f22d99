//! Similarity ranking over embedded chunks and context assembly for answering.

use regex::Regex;
use std::sync::LazyLock;

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").expect("valid camel-case pattern"));

/// A chunk of text together with its embedding.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    /// Chunk text.
    pub text: String,
    /// Embedding of `text`.
    pub vector: Vec<f32>,
}

/// A chunk scored against a query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedChunk {
    /// Chunk text.
    pub text: String,
    /// Cosine similarity to the query.
    pub score: f32,
}

/// Cosine similarity of two vectors; zero when lengths differ or either vector is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold(
        (0.0_f32, 0.0_f32, 0.0_f32),
        |(dot, norm_a, norm_b), (x, y)| (dot + x * y, norm_a + x * x, norm_b + y * y),
    );

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Rank chunks by similarity to `query`, best first, keeping at most `top_k`.
pub fn rank_chunks(query: &[f32], chunks: &[EmbeddedChunk], top_k: usize) -> Vec<RankedChunk> {
    let mut ranked: Vec<RankedChunk> = chunks
        .iter()
        .map(|chunk| RankedChunk {
            text: chunk.text.clone(),
            score: cosine_similarity(query, &chunk.vector),
        })
        .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(top_k);
    ranked
}

/// Join chunk texts into one context string.
///
/// Empty chunks are skipped and camelCase joins left by extraction ("endOfPage") are split.
pub fn build_context<S: AsRef<str>>(chunks: &[S]) -> String {
    let joined = chunks
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|chunk| !chunk.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    CAMEL_BOUNDARY.replace_all(&joined, "$1 $2").into_owned()
}
