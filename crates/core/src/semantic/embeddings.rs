//! Sentence embeddings for question deduplication
//!
//! [`OllamaEmbedder`] calls an embedding model over HTTP. [`HashingEmbedder`]
//! needs no service: it hashes lowercase word unigrams and bigrams into a
//! fixed number of signed buckets and L2-normalises the result, so questions
//! sharing most of their wording land close together.

use crate::ai::client::{EmbedRequest, OllamaClient};
use crate::error::QagenError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word pattern is valid"));

/// Errors that can occur during embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// The embedding service failed or could not be reached
    #[error("Failed to generate embeddings: {0}")]
    Backend(String),

    /// The embedding service is unreachable
    #[error("Embedding service unavailable: {0}")]
    Unavailable(String),

    /// Empty text provided for embedding
    #[error("Cannot generate embedding for empty text")]
    EmptyText,

    /// Embedding dimension mismatch
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl From<QagenError> for EmbeddingError {
    fn from(error: QagenError) -> Self {
        match error {
            QagenError::CollaboratorUnavailable { message, .. } => EmbeddingError::Unavailable(message),
            QagenError::Timeout { operation } => EmbeddingError::Unavailable(operation),
            other => EmbeddingError::Backend(other.to_string()),
        }
    }
}

impl From<EmbeddingError> for QagenError {
    fn from(error: EmbeddingError) -> Self {
        match error {
            EmbeddingError::Unavailable(message) => QagenError::unavailable("embeddings", message),
            other => QagenError::embedding(other.to_string()),
        }
    }
}

/// Sentence embedding capability
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// Embed one text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed several texts, checking that every vector has the same dimension
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        let mut expected_dimension: Option<usize> = None;

        for text in texts {
            let embedding = self.embed(text).await?;
            match expected_dimension {
                Some(expected) if embedding.len() != expected => {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected,
                        actual: embedding.len(),
                    });
                }
                Some(_) => {}
                None => expected_dimension = Some(embedding.len()),
            }
            embeddings.push(embedding);
        }

        debug!(
            "Generated {} embeddings with dimension {}",
            embeddings.len(),
            expected_dimension.unwrap_or(0)
        );
        Ok(embeddings)
    }
}

/// Embeddings from an Ollama embedding model
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    client: OllamaClient,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyText);
        }

        let embedding = self
            .client
            .embed(EmbedRequest {
                model: self.model.clone(),
                prompt: text.to_string(),
            })
            .await
            .map_err(|e| {
                warn!("Failed to generate embedding: {}", e);
                EmbeddingError::from(e)
            })?;

        debug!("Generated embedding with dimension {}", embedding.len());
        Ok(embedding)
    }
}

/// Signed feature hashing over word unigrams and bigrams
///
/// # Examples
///
/// ```
/// use qagen_core::semantic::{cosine_similarity, HashingEmbedder};
///
/// let embedder = HashingEmbedder::new(256);
/// let a = embedder.embed_text("What does the EcoTank system reduce?");
/// let b = embedder.embed_text("What does the EcoTank system reduce");
/// assert!(cosine_similarity(&a, &b).unwrap() > 0.99);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed synchronously; empty text yields the zero vector
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let words: Vec<String> = WORD
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect();

        let mut vector = vec![0.0f32; self.dimensions];
        for word in &words {
            self.add_feature(&mut vector, word);
        }
        for pair in words.windows(2) {
            self.add_feature(&mut vector, &format!("{} {}", pair[0], pair[1]));
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str) {
        let digest = Sha256::digest(feature.as_bytes());
        let bucket = u64::from_le_bytes([
            digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
        ]);
        let index = (bucket % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[index] += sign;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.embed_text(text))
    }
}
