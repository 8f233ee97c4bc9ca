//! Greedy, order-preserving question deduplication
//!
//! Each question is compared with the questions already kept; the first
//! one seen wins. The comparison goes through [`QuestionIndex`] so the
//! linear scan can be replaced by an approximate nearest-neighbour index
//! when batches grow.

use crate::error::Result;
use crate::semantic::{similarity_or_zero, Embedder, SimilarityError};
use crate::types::GeneratedQa;
use tracing::debug;

/// Store of kept question embeddings
pub trait QuestionIndex: Send {
    /// Highest similarity between `embedding` and any stored embedding,
    /// or `None` when the index is empty
    fn max_similarity(&self, embedding: &[f32]) -> std::result::Result<Option<f32>, SimilarityError>;

    fn insert(&mut self, embedding: Vec<f32>);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exhaustive pairwise index
#[derive(Debug, Default, Clone)]
pub struct LinearIndex {
    embeddings: Vec<Vec<f32>>,
}

impl LinearIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuestionIndex for LinearIndex {
    fn max_similarity(&self, embedding: &[f32]) -> std::result::Result<Option<f32>, SimilarityError> {
        let mut best: Option<f32> = None;
        for kept in &self.embeddings {
            let similarity = similarity_or_zero(embedding, kept)?;
            best = Some(best.map_or(similarity, |b| b.max(similarity)));
        }
        Ok(best)
    }

    fn insert(&mut self, embedding: Vec<f32>) {
        self.embeddings.push(embedding);
    }

    fn len(&self) -> usize {
        self.embeddings.len()
    }
}

/// Drop pairs whose question is at least `threshold` similar to a kept one
///
/// Blank questions are never embedded and always kept.
pub async fn filter_duplicates(
    qas: Vec<GeneratedQa>,
    embedder: &dyn Embedder,
    threshold: f32,
) -> Result<Vec<GeneratedQa>> {
    let mut index = LinearIndex::new();
    filter_duplicates_with(qas, embedder, threshold, &mut index).await
}

/// [`filter_duplicates`] against a caller-supplied index
pub async fn filter_duplicates_with(
    qas: Vec<GeneratedQa>,
    embedder: &dyn Embedder,
    threshold: f32,
    index: &mut dyn QuestionIndex,
) -> Result<Vec<GeneratedQa>> {
    let total = qas.len();
    let mut kept = Vec::with_capacity(total);

    for qa in qas {
        if qa.question.trim().is_empty() {
            kept.push(qa);
            continue;
        }

        let embedding = embedder.embed(&qa.question).await?;
        match index.max_similarity(&embedding)? {
            Some(similarity) if similarity >= threshold => {
                debug!(
                    question = %qa.question,
                    similarity,
                    "Dropping duplicate question"
                );
            }
            _ => {
                index.insert(embedding);
                kept.push(qa);
            }
        }
    }

    debug!(total, kept = kept.len(), threshold, "Deduplicated questions");
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QagenError;
    use crate::semantic::{EmbeddingError, HashingEmbedder};
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Embeds known questions to fixed vectors
    struct TableEmbedder(HashMap<&'static str, Vec<f32>>);

    #[async_trait]
    impl Embedder for TableEmbedder {
        fn name(&self) -> &str {
            "table"
        }

        async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
            self.0
                .get(text)
                .cloned()
                .ok_or_else(|| EmbeddingError::Backend(format!("unknown text {}", text)))
        }
    }

    fn qa(question: &str) -> GeneratedQa {
        GeneratedQa::new("context", question, "an answer that is long enough")
    }

    #[tokio::test]
    async fn test_first_seen_wins() {
        // cos(a, b) = 0.9, cos(a, c) = 0
        let embedder = TableEmbedder(HashMap::from([
            ("first", vec![1.0, 0.0]),
            ("second", vec![0.9, 0.43589]),
            ("third", vec![0.0, 1.0]),
        ]));

        let kept = filter_duplicates(vec![qa("first"), qa("second"), qa("third")], &embedder, 0.85)
            .await
            .unwrap();
        let questions: Vec<_> = kept.iter().map(|q| q.question.as_str()).collect();
        assert_eq!(questions, vec!["first", "third"]);
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let embedder = TableEmbedder(HashMap::from([
            ("first", vec![1.0, 0.0]),
            ("same", vec![2.0, 0.0]),
        ]));
        let kept = filter_duplicates(vec![qa("first"), qa("same")], &embedder, 1.0)
            .await
            .unwrap();
        assert_eq!(kept.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_questions_are_kept_without_embedding() {
        let embedder = TableEmbedder(HashMap::from([("first", vec![1.0, 0.0])]));
        let kept = filter_duplicates(vec![qa(" "), qa("first"), qa("")], &embedder, 0.85)
            .await
            .unwrap();
        assert_eq!(kept.len(), 3);
    }

    #[tokio::test]
    async fn test_embedder_failure_propagates() {
        let embedder = TableEmbedder(HashMap::new());
        let result = filter_duplicates(vec![qa("unknown")], &embedder, 0.85).await;
        assert_matches!(result, Err(QagenError::Embedding { .. }));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_an_error() {
        let embedder = TableEmbedder(HashMap::from([
            ("first", vec![1.0, 0.0]),
            ("second", vec![1.0, 0.0, 0.0]),
        ]));
        let result = filter_duplicates(vec![qa("first"), qa("second")], &embedder, 0.85).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_filtering_is_idempotent() {
        let embedder = HashingEmbedder::default();
        let qas = vec![
            qa("What does the EcoTank system reduce?"),
            qa("What does the EcoTank system reduce"),
            qa("Who makes the WorkForce Pro printers?"),
            qa("How much ink does a refill bottle hold?"),
        ];

        let once = filter_duplicates(qas, &embedder, 0.85).await.unwrap();
        assert_eq!(once.len(), 3);
        let twice = filter_duplicates(once.clone(), &embedder, 0.85).await.unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_linear_index() {
        let mut index = LinearIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.max_similarity(&[1.0, 0.0]).unwrap(), None);

        index.insert(vec![1.0, 0.0]);
        index.insert(vec![0.0, 1.0]);
        let best = index.max_similarity(&[1.0, 0.1]).unwrap().unwrap();
        assert!(best > 0.99);
        assert_eq!(index.len(), 2);
    }
}
