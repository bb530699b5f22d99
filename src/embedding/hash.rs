//! Deterministic hash embeddings used when no embedding model is reachable.
//!
//! Both strategies accumulate into a fixed 384-slot vector (the width of all-MiniLM-L6-v2, so
//! fallback vectors stay comparable in shape with model vectors) and L2-normalize the result.
//! Accumulation runs in `f64`; the normalized vector is emitted as `f32`.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// Width of every embedding produced by this module.
pub const EMBEDDING_DIMENSION: usize = 384;

/// Dense embedding vector.
pub type Embedding = Vec<f32>;

/// Hashing scheme used to derive a vector from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingStrategy {
    /// Character codes accumulated by position.
    #[serde(alias = "character")]
    Char,
    /// Word frequencies accumulated at hashed slots.
    #[default]
    Word,
}

impl EmbeddingStrategy {
    /// Lowercase label used in configuration and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::Word => "word",
        }
    }
}

impl fmt::Display for EmbeddingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EmbeddingStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "char" | "character" => Ok(Self::Char),
            "word" => Ok(Self::Word),
            _ => Err(()),
        }
    }
}

/// Embed `text` with the selected strategy. Never fails; empty text yields the zero vector.
pub fn generate_embedding(text: &str, strategy: EmbeddingStrategy) -> Embedding {
    match strategy {
        EmbeddingStrategy::Char => char_position_embedding(text),
        EmbeddingStrategy::Word => word_frequency_embedding(text),
    }
}

/// Embed a batch of texts, preserving order.
pub fn generate_embeddings<S: AsRef<str>>(
    texts: &[S],
    strategy: EmbeddingStrategy,
) -> Vec<Embedding> {
    texts
        .iter()
        .map(|text| generate_embedding(text.as_ref(), strategy))
        .collect()
}

/// Add `code / 1000` for each UTF-16 code unit at slot `index mod 384`.
pub fn char_position_embedding(text: &str) -> Embedding {
    let mut accumulator = [0.0_f64; EMBEDDING_DIMENSION];
    for (idx, code) in text.encode_utf16().enumerate() {
        accumulator[idx % EMBEDDING_DIMENSION] += f64::from(code) / 1000.0;
    }
    normalize(&accumulator)
}

/// Add each distinct word's frequency at slot `|hash(word)| mod 384`.
///
/// Words are lowercased whitespace-separated tokens. Distinct words may share a slot.
pub fn word_frequency_embedding(text: &str) -> Embedding {
    let lower = text.to_lowercase();
    let mut frequencies: HashMap<&str, u32> = HashMap::new();
    for word in lower.split_whitespace() {
        *frequencies.entry(word).or_default() += 1;
    }

    let mut accumulator = [0.0_f64; EMBEDDING_DIMENSION];
    for (word, frequency) in frequencies {
        accumulator[hash_slot(word)] += f64::from(frequency);
    }
    normalize(&accumulator)
}

/// 32-bit wrapping polynomial hash (`h = h * 31 + code`) over UTF-16 code units.
pub fn polynomial_hash(word: &str) -> i32 {
    word.encode_utf16().fold(0_i32, |hash, code| {
        hash.wrapping_mul(31).wrapping_add(i32::from(code))
    })
}

fn hash_slot(word: &str) -> usize {
    let magnitude = i64::from(polynomial_hash(word)).unsigned_abs();
    (magnitude % EMBEDDING_DIMENSION as u64) as usize
}

fn normalize(accumulator: &[f64; EMBEDDING_DIMENSION]) -> Embedding {
    let magnitude = accumulator.iter().map(|value| value * value).sum::<f64>().sqrt();
    if magnitude > 0.0 {
        accumulator
            .iter()
            .map(|value| (value / magnitude) as f32)
            .collect()
    } else {
        vec![0.0; EMBEDDING_DIMENSION]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(vector: &[f32]) -> f64 {
        vector
            .iter()
            .map(|value| f64::from(*value) * f64::from(*value))
            .sum::<f64>()
            .sqrt()
    }

    #[test]
    fn vectors_have_fixed_width_and_unit_norm() {
        for strategy in [EmbeddingStrategy::Char, EmbeddingStrategy::Word] {
            let vector = generate_embedding("The quick brown fox jumps over the lazy dog", strategy);
            assert_eq!(vector.len(), EMBEDDING_DIMENSION);
            assert!((norm(&vector) - 1.0).abs() < 1e-6, "{strategy}");
        }
    }

    #[test]
    fn empty_text_yields_zero_vector() {
        for strategy in [EmbeddingStrategy::Char, EmbeddingStrategy::Word] {
            assert_eq!(generate_embedding("", strategy), vec![0.0_f32; EMBEDDING_DIMENSION]);
        }
        assert_eq!(
            generate_embedding(" \n\t", EmbeddingStrategy::Word),
            vec![0.0_f32; EMBEDDING_DIMENSION]
        );
        // U+0000 contributes nothing to the accumulator.
        assert_eq!(
            generate_embedding("\0", EmbeddingStrategy::Char),
            vec![0.0_f32; EMBEDDING_DIMENSION]
        );
    }

    #[test]
    fn embeddings_are_deterministic() {
        let text = "Deterministic hashing keeps fallback vectors stable across calls";
        for strategy in [EmbeddingStrategy::Char, EmbeddingStrategy::Word] {
            let first = generate_embedding(text, strategy);
            let second = generate_embedding(text, strategy);
            let first_bits: Vec<u32> = first.iter().map(|v| v.to_bits()).collect();
            let second_bits: Vec<u32> = second.iter().map(|v| v.to_bits()).collect();
            assert_eq!(first_bits, second_bits);
        }
    }

    #[test]
    fn polynomial_hash_matches_reference_values() {
        assert_eq!(polynomial_hash(""), 0);
        assert_eq!(polynomial_hash("a"), 97);
        assert_eq!(polynomial_hash("ab"), 97 * 31 + 98);
        assert_eq!(polynomial_hash("hello"), 99_162_322);
        // Long inputs wrap around 32 bits instead of overflowing.
        let _ = polynomial_hash(&"z".repeat(64));
    }

    #[test]
    fn word_strategy_counts_frequencies_case_insensitively() {
        let vector = generate_embedding("Rust rust RUST", EmbeddingStrategy::Word);
        let slot = hash_slot("rust");
        assert!((vector[slot] - 1.0).abs() < 1e-6);
        assert_eq!(vector.iter().filter(|value| **value != 0.0).count(), 1);
    }

    #[test]
    fn char_strategy_wraps_positions() {
        let text = "a".repeat(EMBEDDING_DIMENSION + 1);
        let vector = generate_embedding(&text, EmbeddingStrategy::Char);
        // Slot 0 holds two characters, every other slot one.
        assert!(vector[0] > vector[1]);
        assert!((vector[0] / vector[1] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn strategy_parses_labels() {
        assert_eq!("WORD".parse::<EmbeddingStrategy>(), Ok(EmbeddingStrategy::Word));
        assert_eq!("char".parse::<EmbeddingStrategy>(), Ok(EmbeddingStrategy::Char));
        assert!("bert".parse::<EmbeddingStrategy>().is_err());
    }

    #[test]
    fn strategy_deserializes_character_alias() {
        let parse =
            |label: &str| serde_json::from_value::<EmbeddingStrategy>(serde_json::json!(label));
        assert_eq!(parse("character").expect("alias"), EmbeddingStrategy::Char);
        assert_eq!(parse("char").expect("label"), EmbeddingStrategy::Char);
        assert_eq!(parse("word").expect("label"), EmbeddingStrategy::Word);
    }
}
