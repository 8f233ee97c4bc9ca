//! Core data types shared across the pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;

/// A generated question/answer pair for one context
///
/// `quality` starts unset and is filled in by the quality evaluator before
/// validation sees the pair. Validation never edits a pair; it only keeps
/// or discards whole values.
///
/// # Examples
///
/// ```
/// use qagen_core::types::GeneratedQa;
///
/// let qa = GeneratedQa::new(
///     "The EcoTank system drastically reduces printing costs.",
///     "What does the EcoTank system reduce?",
///     "It drastically reduces printing costs.",
/// );
/// assert!(qa.quality.is_none());
/// assert_eq!(qa.quality_or_zero(), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQa {
    pub context: String,
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub quality: Option<f64>,
}

impl GeneratedQa {
    /// Create an unscored pair
    pub fn new(
        context: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            context: context.into(),
            question: question.into(),
            answer: answer.into(),
            quality: None,
        }
    }

    /// Attach a quality score
    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = Some(quality);
        self
    }

    /// Quality used for ordering; a missing score ranks as zero
    pub fn quality_or_zero(&self) -> f64 {
        self.quality.unwrap_or(0.0)
    }
}

/// Context payload accepted by the pipeline: one long text or pre-split chunks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextInput {
    Text(String),
    Chunks(Vec<String>),
}

impl ContextInput {
    /// True when there is no non-blank text at all
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Chunks(chunks) => chunks.iter().all(|c| c.trim().is_empty()),
        }
    }

    /// Number of contexts carried (a single text counts as one)
    pub fn len(&self) -> usize {
        match self {
            Self::Text(_) => 1,
            Self::Chunks(chunks) => chunks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Treat the payload as a list of contexts without chunking
    pub fn into_contexts(self) -> Vec<String> {
        match self {
            Self::Text(text) => vec![text],
            Self::Chunks(chunks) => chunks,
        }
    }
}

impl From<&str> for ContextInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<String>> for ContextInput {
    fn from(chunks: Vec<String>) -> Self {
        Self::Chunks(chunks)
    }
}

/// Short identifier correlating the log lines of one pipeline request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessCode(String);

impl ProcessCode {
    /// Generate a new five character code from a random UUID
    pub fn new() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self(hex.chars().take(5).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProcessCode {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProcessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
