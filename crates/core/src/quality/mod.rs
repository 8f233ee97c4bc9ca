//! Quality scoring for generated question/answer pairs
//!
//! A pair is scored on three axes, each in `[0, 1]`:
//!
//! - relevance: entity overlap between context and answer, averaged with
//!   their TF-IDF cosine similarity
//! - accuracy: share of the question's content words found in the answer
//! - coherence: surface punctuation, adjacent word repetition and grammar
//!
//! The overall quality is the unweighted mean. Every value is rounded to
//! three decimals.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

pub mod entities;
pub mod grammar;
pub mod tfidf;

pub use entities::{EntityExtractor, HeuristicEntityExtractor};
pub use grammar::{GrammarChecker, LanguageToolClient, RuleBasedGrammarChecker};
pub use tfidf::tfidf_cosine;

/// Question words that carry no content
const QUESTION_STOPWORDS: &[&str] = &[
    "what", "which", "how", "where", "why", "is", "are", "was", "the", "a", "an", "of", "to", "in",
];

/// Entity overlap used when the context has no entities
const NEUTRAL_SCORE: f64 = 0.5;

/// Default number of grammar errors that zeroes the grammar component
pub const DEFAULT_GRAMMAR_ERROR_SCALE: f64 = 5.0;

fn round3(value: f64) -> f64 {
    ((value * 1000.0).round() / 1000.0).clamp(0.0, 1.0)
}

/// Sub-scores of one pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScores {
    pub relevance: f64,
    pub accuracy: f64,
    pub coherence: f64,
}

impl QualityScores {
    /// Unweighted mean of the three sub-scores
    pub fn quality(&self) -> f64 {
        round3((self.relevance + self.accuracy + self.coherence) / 3.0)
    }
}

/// Scores pairs using shared, read-only collaborators
#[derive(Clone)]
pub struct QualityEvaluator {
    entities: Arc<dyn EntityExtractor>,
    grammar: Arc<dyn GrammarChecker>,
    grammar_error_scale: f64,
}

impl std::fmt::Debug for QualityEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QualityEvaluator")
            .field("grammar", &self.grammar.name())
            .field("grammar_error_scale", &self.grammar_error_scale)
            .finish()
    }
}

impl Default for QualityEvaluator {
    fn default() -> Self {
        Self::new(
            Arc::new(HeuristicEntityExtractor),
            Arc::new(RuleBasedGrammarChecker),
        )
    }
}

impl QualityEvaluator {
    pub fn new(entities: Arc<dyn EntityExtractor>, grammar: Arc<dyn GrammarChecker>) -> Self {
        Self {
            entities,
            grammar,
            grammar_error_scale: DEFAULT_GRAMMAR_ERROR_SCALE,
        }
    }

    /// Set how many grammar errors drive the grammar component to zero
    pub fn with_grammar_error_scale(mut self, scale: f64) -> Self {
        if scale > 0.0 {
            self.grammar_error_scale = scale;
        }
        self
    }

    /// `|entities(context) ∩ entities(answer)| / |entities(context)|`, or 0.5
    /// when the context has no entities
    pub fn shared_entities(&self, context: &str, answer: &str) -> f64 {
        let context_entities = self.entities.extract_entities(context);
        if context_entities.is_empty() {
            return NEUTRAL_SCORE;
        }
        let answer_entities = self.entities.extract_entities(answer);
        let shared = context_entities.intersection(&answer_entities).count();
        shared as f64 / context_entities.len() as f64
    }

    /// TF-IDF cosine similarity capped at 1
    pub fn tfidf_similarity(&self, context: &str, answer: &str) -> f64 {
        tfidf_cosine(context, answer).min(1.0)
    }

    pub fn score_relevance(&self, context: &str, answer: &str) -> f64 {
        let entity_score = self.shared_entities(context, answer);
        let similarity = self.tfidf_similarity(context, answer);
        round3((entity_score + similarity) / 2.0)
    }

    /// Fraction of the question's content words present in the answer
    ///
    /// ```
    /// use qagen_core::quality::QualityEvaluator;
    ///
    /// let evaluator = QualityEvaluator::default();
    /// assert_eq!(evaluator.score_accuracy("What is ink", "ink is a liquid"), 1.0);
    /// assert_eq!(evaluator.score_accuracy("What is the", "anything"), 0.5);
    /// ```
    pub fn score_accuracy(&self, question: &str, answer: &str) -> f64 {
        let question_lower = question.to_lowercase();
        let keywords: HashSet<&str> = question_lower
            .split_whitespace()
            .filter(|word| !QUESTION_STOPWORDS.contains(word))
            .collect();
        if keywords.is_empty() {
            return NEUTRAL_SCORE;
        }

        let answer_lower = answer.to_lowercase();
        let answer_words: HashSet<&str> = answer_lower.split_whitespace().collect();
        let overlap = keywords.intersection(&answer_words).count();
        round3((overlap as f64 / keywords.len() as f64).min(1.0))
    }

    /// Mean of punctuation, repetition and grammar components
    pub async fn score_coherence(&self, answer: &str) -> Result<f64> {
        let trimmed = answer.trim();

        let starts_upper = trimmed.chars().next().map(char::is_uppercase).unwrap_or(false);
        let ends_terminal = trimmed.ends_with(['.', '!', '?']);
        let punctuation = if starts_upper && ends_terminal { 1.0 } else { 0.5 };

        let words: Vec<String> = trimmed.split_whitespace().map(str::to_lowercase).collect();
        let repeated = words.windows(2).any(|pair| pair[0] == pair[1]);
        let repetition = if repeated { 0.0 } else { 1.0 };

        let errors = self.grammar.check_errors(trimmed).await?;
        let grammar = (1.0 - errors as f64 / self.grammar_error_scale).max(0.0);

        debug!(punctuation, repetition, grammar_errors = errors, "Coherence components");
        Ok(round3((punctuation + repetition + grammar) / 3.0))
    }

    /// All three sub-scores of a pair
    pub async fn evaluate(&self, context: &str, question: &str, answer: &str) -> Result<QualityScores> {
        let scores = QualityScores {
            relevance: self.score_relevance(context, answer),
            accuracy: self.score_accuracy(question, answer),
            coherence: self.score_coherence(answer).await?,
        };
        debug!(
            relevance = scores.relevance,
            accuracy = scores.accuracy,
            coherence = scores.coherence,
            "Evaluated pair"
        );
        Ok(scores)
    }

    /// Overall quality of a pair
    pub async fn score(&self, context: &str, question: &str, answer: &str) -> Result<f64> {
        Ok(self.evaluate(context, question, answer).await?.quality())
    }
}
