//! Cross-cutting, shared constants.
//!
//! Prefer deriving secondary constants from primary ones to avoid drift.
//!
//! # Dimension Invariants
//!
//! The name-vector dimension is treated as an invariant across modules
//! (vectorizer, index, reranker): query vectors must be featurized exactly the
//! way the index was built. If you need runtime-configurable dimensions:
//!
//! 1. Pass the dimension through [`crate::config::VectorizerConfig`]
//! 2. Use [`validate_vector_dim`] at module boundaries to catch mismatches early
//! 3. The compile-time constants remain as defaults

/// Default dimensionality of hashed name vectors.
pub const DEFAULT_VECTOR_DIM: usize = 256;

/// Smallest character n-gram extracted from a name.
pub const CHAR_NGRAM_MIN: usize = 3;
/// Largest character n-gram extracted from a name.
pub const CHAR_NGRAM_MAX: usize = 5;
/// Largest word n-gram extracted from a name (unigrams are always emitted).
pub const WORD_NGRAM_MAX: usize = 2;

/// Upper bound on candidates any single tier may hand to the reranker.
pub const DEFAULT_MAX_RERANK_CANDIDATES: usize = 64;

/// Error returned when vector dimension validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimValidationError {
    /// Vector dimension cannot be zero.
    ZeroDimension,
    /// Runtime dimension does not match expected dimension.
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DimValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "vector dimension cannot be zero"),
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for DimValidationError {}

/// Validates that a runtime vector dimension matches the expected dimension.
///
/// Use this at module boundaries, rather than encountering silent score
/// corruption deep in the funnel.
///
/// # Example
///
/// ```
/// use gatehouse::constants::{validate_vector_dim, DEFAULT_VECTOR_DIM};
///
/// let query_dim = 256;
/// validate_vector_dim(query_dim, DEFAULT_VECTOR_DIM).unwrap();
/// ```
pub fn validate_vector_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if expected == 0 {
        return Err(DimValidationError::ZeroDimension);
    }
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_vector_dim_match() {
        assert!(validate_vector_dim(DEFAULT_VECTOR_DIM, DEFAULT_VECTOR_DIM).is_ok());
    }

    #[test]
    fn test_validate_vector_dim_mismatch() {
        assert_eq!(
            validate_vector_dim(128, 256),
            Err(DimValidationError::DimensionMismatch {
                expected: 256,
                actual: 128
            })
        );
    }

    #[test]
    fn test_validate_vector_dim_zero() {
        assert_eq!(
            validate_vector_dim(0, 0),
            Err(DimValidationError::ZeroDimension)
        );
    }

    #[test]
    fn test_error_display() {
        let err = DimValidationError::ZeroDimension;
        assert_eq!(err.to_string(), "vector dimension cannot be zero");

        let err = DimValidationError::DimensionMismatch {
            expected: 256,
            actual: 128,
        };
        assert!(err.to_string().contains("256"));
        assert!(err.to_string().contains("128"));
    }
}
