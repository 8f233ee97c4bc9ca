//! Answer validation, deduplication and ranking
//!
//! [`QaCurator::validate_and_deduplicate`] applies the stages in a fixed
//! order: drop invalid answers, drop duplicate questions, then sort by
//! quality. An empty result at either filtering stage is an error so the
//! caller can tell "nothing survived" apart from success.

use crate::config::ValidationConfig;
use crate::error::{QagenError, Result};
use crate::semantic::Embedder;
use crate::types::GeneratedQa;
use std::sync::Arc;
use tracing::{info, instrument};

pub mod dedup;

pub use dedup::{filter_duplicates, filter_duplicates_with, LinearIndex, QuestionIndex};

/// Rejects empty, short and degenerate answers
#[derive(Debug, Clone)]
pub struct AnswerValidator {
    min_chars: usize,
    blacklist: Vec<String>,
}

impl AnswerValidator {
    pub fn new(min_chars: usize, blacklist: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            min_chars,
            blacklist: blacklist
                .into_iter()
                .map(|entry| entry.into().trim().to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(config.min_answer_chars, config.blacklist.iter().cloned())
    }

    /// Whether an answer is worth keeping
    ///
    /// ```
    /// use qagen_core::validation::AnswerValidator;
    ///
    /// let validator = AnswerValidator::default();
    /// assert!(validator.is_valid_answer("It drastically reduces printing costs."));
    /// assert!(!validator.is_valid_answer("N/A"));
    /// assert!(!validator.is_valid_answer("too short"));
    /// ```
    pub fn is_valid_answer(&self, answer: &str) -> bool {
        let trimmed = answer.trim();
        if trimmed.is_empty() || trimmed.chars().count() < self.min_chars {
            return false;
        }
        let lowered = trimmed.to_lowercase();
        !self.blacklist.iter().any(|entry| *entry == lowered)
    }
}

impl Default for AnswerValidator {
    fn default() -> Self {
        Self::from_config(&ValidationConfig::default())
    }
}

/// Validation and deduplication stage of the pipeline
#[derive(Clone)]
pub struct QaCurator {
    validator: AnswerValidator,
    embedder: Arc<dyn Embedder>,
    duplicate_threshold: f32,
}

impl std::fmt::Debug for QaCurator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaCurator")
            .field("validator", &self.validator)
            .field("embedder", &self.embedder.name())
            .field("duplicate_threshold", &self.duplicate_threshold)
            .finish()
    }
}

impl QaCurator {
    pub fn new(validator: AnswerValidator, embedder: Arc<dyn Embedder>, duplicate_threshold: f32) -> Self {
        Self {
            validator,
            embedder,
            duplicate_threshold,
        }
    }

    pub fn from_config(config: &ValidationConfig, embedder: Arc<dyn Embedder>) -> Self {
        Self::new(
            AnswerValidator::from_config(config),
            embedder,
            config.duplicate_threshold,
        )
    }

    pub fn validator(&self) -> &AnswerValidator {
        &self.validator
    }

    /// Validate, deduplicate and rank pairs
    ///
    /// # Errors
    ///
    /// - `EmptyInput` when `qas` is empty
    /// - `NoValidQa` when no answer passes validation
    /// - `AllDuplicates` when deduplication leaves nothing
    /// - embedding errors from the embedder
    #[instrument(skip(self, qas), fields(stage = "VALIDATING", count = qas.len()))]
    pub async fn validate_and_deduplicate(&self, qas: Vec<GeneratedQa>) -> Result<Vec<GeneratedQa>> {
        if qas.is_empty() {
            return Err(QagenError::empty_input("no question/answer pairs to validate"));
        }

        let total = qas.len();
        let valid: Vec<GeneratedQa> = qas
            .into_iter()
            .filter(|qa| self.validator.is_valid_answer(&qa.answer))
            .collect();
        if valid.is_empty() {
            return Err(QagenError::NoValidQa);
        }
        let valid_count = valid.len();

        let mut unique = filter_duplicates(valid, self.embedder.as_ref(), self.duplicate_threshold).await?;
        if unique.is_empty() {
            return Err(QagenError::AllDuplicates);
        }

        sort_by_quality(&mut unique);

        info!(
            total,
            valid = valid_count,
            unique = unique.len(),
            "Validated and deduplicated pairs"
        );
        Ok(unique)
    }
}

/// Stable sort by descending quality, missing scores rank as zero
pub fn sort_by_quality(qas: &mut [GeneratedQa]) {
    qas.sort_by(|a, b| b.quality_or_zero().total_cmp(&a.quality_or_zero()));
}
