//! Vector similarity used by question deduplication

use thiserror::Error;

/// Errors that can occur during similarity calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimilarityError {
    /// Vector dimensions do not match
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// One or both vectors are zero vectors (no magnitude)
    #[error("Cannot calculate similarity for zero vector")]
    ZeroVector,

    /// Invalid value encountered (NaN or infinite)
    #[error("Invalid value in similarity calculation: {0}")]
    InvalidValue(String),
}

impl From<SimilarityError> for crate::QagenError {
    fn from(error: SimilarityError) -> Self {
        crate::QagenError::embedding(error.to_string())
    }
}

/// Calculates the cosine similarity between two vectors
///
/// Cosine similarity measures the cosine of the angle between two vectors,
/// ranging from -1 (opposite) to 1 (identical).
///
/// # Errors
///
/// Returns `SimilarityError::DimensionMismatch` if vectors have different dimensions
/// Returns `SimilarityError::ZeroVector` if either vector has zero magnitude
/// Returns `SimilarityError::InvalidValue` if NaN or infinite values are encountered
///
/// # Examples
///
/// ```
/// use qagen_core::semantic::similarity::cosine_similarity;
///
/// let a = vec![1.0, 0.0, 0.0];
/// let b = vec![1.0, 0.0, 0.0];
/// let similarity = cosine_similarity(&a, &b).unwrap();
/// assert!((similarity - 1.0).abs() < 0.0001);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    if a.is_empty() {
        return Err(SimilarityError::DimensionMismatch {
            expected: 0,
            actual: 0,
        });
    }

    let mut dot_product = 0.0;
    let mut magnitude_a = 0.0;
    let mut magnitude_b = 0.0;

    for (x, y) in a.iter().zip(b) {
        dot_product += x * y;
        magnitude_a += x * x;
        magnitude_b += y * y;
    }

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Err(SimilarityError::ZeroVector);
    }

    let similarity = dot_product / (magnitude_a.sqrt() * magnitude_b.sqrt());

    if similarity.is_nan() {
        return Err(SimilarityError::InvalidValue("NaN".to_string()));
    }
    if similarity.is_infinite() {
        return Err(SimilarityError::InvalidValue("Infinite".to_string()));
    }

    // Rounding can push parallel vectors slightly past one
    Ok(similarity.clamp(-1.0, 1.0))
}

/// Cosine similarity where a zero vector counts as unrelated
///
/// An empty question embeds to the zero vector; treating it as similarity
/// zero keeps it from being reported as a duplicate of anything.
pub fn similarity_or_zero(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    match cosine_similarity(a, b) {
        Err(SimilarityError::ZeroVector) => Ok(0.0),
        other => other,
    }
}
