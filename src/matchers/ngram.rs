//! Hashed n-gram name vectorization.
//!
//! Names are featurized into character 3–5-grams (over the space-padded
//! joined name) and word 1–2-grams, folded into a fixed dimension by hashing,
//! and L2-normalized. The routine is fully deterministic: query vectors are
//! only comparable to index vectors when both sides were produced by the same
//! configuration, so the dimension travels through config rather than being
//! assumed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{CHAR_NGRAM_MAX, CHAR_NGRAM_MIN, DEFAULT_VECTOR_DIM, WORD_NGRAM_MAX};
use crate::entity::normalize_name;
use crate::hashing::hash_to_u64;

/// Errors from vectorizer configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VectorizerError {
    /// Vector dimension cannot be zero.
    #[error("vector dimension cannot be zero")]
    ZeroDimension,

    /// Character n-gram bounds are inverted or zero.
    #[error("invalid char n-gram range {min}..={max}")]
    InvalidCharRange { min: usize, max: usize },

    /// Word n-gram ceiling must emit at least unigrams.
    #[error("word n-gram ceiling cannot be zero")]
    ZeroWordMax,
}

/// Featurization parameters. Must match the parameters the index was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Output dimension.
    pub dim: usize,
    /// Smallest character n-gram.
    pub char_min: usize,
    /// Largest character n-gram.
    pub char_max: usize,
    /// Largest word n-gram (unigrams are always emitted).
    pub word_max: usize,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            dim: DEFAULT_VECTOR_DIM,
            char_min: CHAR_NGRAM_MIN,
            char_max: CHAR_NGRAM_MAX,
            word_max: WORD_NGRAM_MAX,
        }
    }
}

impl VectorizerConfig {
    const ENV_VECTOR_DIM: &'static str = "GATEHOUSE_VECTOR_DIM";

    /// Loads the configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let dim = std::env::var(Self::ENV_VECTOR_DIM)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.dim);
        Self { dim, ..defaults }
    }

    #[must_use]
    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = dim;
        self
    }

    pub fn validate(&self) -> Result<(), VectorizerError> {
        if self.dim == 0 {
            return Err(VectorizerError::ZeroDimension);
        }
        if self.char_min == 0 || self.char_min > self.char_max {
            return Err(VectorizerError::InvalidCharRange {
                min: self.char_min,
                max: self.char_max,
            });
        }
        if self.word_max == 0 {
            return Err(VectorizerError::ZeroWordMax);
        }
        Ok(())
    }
}

/// Deterministic name-to-vector featurizer.
#[derive(Debug, Clone)]
pub struct NameVectorizer {
    config: VectorizerConfig,
}

impl NameVectorizer {
    pub fn new(config: VectorizerConfig) -> Result<Self, VectorizerError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.config.dim
    }

    /// Folds one feature into its bucket. The tag byte keeps character and
    /// word grams in disjoint feature families.
    #[inline]
    fn bucket(&self, tag: u8, gram: &str) -> usize {
        let mut buf = Vec::with_capacity(2 + gram.len());
        buf.push(tag);
        buf.push(b':');
        buf.extend_from_slice(gram.as_bytes());
        (hash_to_u64(&buf) % self.config.dim as u64) as usize
    }

    /// Vectorizes a name. Blank input yields the zero vector.
    pub fn vectorize(&self, name: &str) -> Vec<f32> {
        let normalized = normalize_name(name);
        let mut vector = vec![0.0f32; self.config.dim];
        if normalized.is_empty() {
            return vector;
        }

        let padded: Vec<char> = format!(" {} ", normalized).chars().collect();
        for n in self.config.char_min..=self.config.char_max {
            for window in padded.windows(n) {
                let gram: String = window.iter().collect();
                vector[self.bucket(b'c', &gram)] += 1.0;
            }
        }

        let words: Vec<&str> = normalized.split(' ').collect();
        for word in &words {
            vector[self.bucket(b'w', word)] += 1.0;
        }
        for n in 2..=self.config.word_max {
            for pair in words.windows(n) {
                let gram = pair.join(" ");
                vector[self.bucket(b'w', &gram)] += 1.0;
            }
        }

        l2_normalize(&mut vector);
        vector
    }
}

/// Scales a vector to unit length. The zero vector stays zero.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Cosine similarity. Mismatched lengths and zero vectors score 0.0.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|v| v * v).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectorizer() -> NameVectorizer {
        NameVectorizer::new(VectorizerConfig::default()).expect("default config is valid")
    }

    #[test]
    fn test_vectorize_determinism() {
        let v = vectorizer();
        assert_eq!(v.vectorize("ivan petrov"), v.vectorize("ivan petrov"));
    }

    #[test]
    fn test_vectorize_is_unit_length() {
        let v = vectorizer().vectorize("ivan petrov");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_identical_names_have_cosine_one() {
        let v = vectorizer();
        let a = v.vectorize("ivan petrov");
        let b = v.vectorize("Ivan  PETROV");

        assert!(cosine(&a, &b) > 0.999);
    }

    #[test]
    fn test_typo_variant_stays_close() {
        let v = vectorizer();
        let a = v.vectorize("ivan petrov");
        let b = v.vectorize("ivan petroff");

        assert!(cosine(&a, &b) > 0.5);
    }

    #[test]
    fn test_unrelated_names_stay_far() {
        let v = vectorizer();
        let a = v.vectorize("ivan petrov");
        let b = v.vectorize("acme global holdings");

        assert!(cosine(&a, &b) < 0.3);
    }

    #[test]
    fn test_blank_name_yields_zero_vector() {
        let v = vectorizer();
        let zero = v.vectorize("   ");

        assert_eq!(zero.len(), v.dim());
        assert!(zero.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_zero_dim_rejected() {
        let err = NameVectorizer::new(VectorizerConfig::default().with_dim(0))
            .expect_err("zero dim must fail");
        assert_eq!(err, VectorizerError::ZeroDimension);
    }

    #[test]
    fn test_inverted_char_range_rejected() {
        let config = VectorizerConfig {
            char_min: 6,
            char_max: 3,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(VectorizerError::InvalidCharRange { min: 6, max: 3 })
        );
    }

    #[test]
    fn test_cosine_length_mismatch_is_zero() {
        assert_eq!(cosine(&[1.0, 0.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_cosine_zero_vector_is_zero() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
