//! Embeddings and vector similarity
//!
//! - [`embeddings`] - the [`Embedder`] capability and its implementations
//! - [`similarity`] - cosine similarity with explicit error cases

pub mod embeddings;
pub mod similarity;

pub use embeddings::{Embedder, EmbeddingError, HashingEmbedder, OllamaEmbedder};
pub use similarity::{cosine_similarity, similarity_or_zero, SimilarityError};
