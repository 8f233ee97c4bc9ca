//! Text generation against text-to-text models
//!
//! Backends implement [`TextGenerator`] and return raw result records. The
//! [`generator::QaGenerator`] turns those records into [`GenerationOutcome`]
//! values so a missing `generated_text` field is always surfaced as a format
//! error instead of flowing into scoring.

use crate::error::{QagenError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod client;
pub mod generator;
pub mod prompts;
pub mod text2text;

pub use client::{OllamaClient, OllamaGenerator};
pub use generator::QaGenerator;
pub use prompts::PromptLibrary;
pub use text2text::Text2TextClient;

/// Decoding parameters understood by the generation backends
///
/// Unset options are left to the backend's defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DecodingParams {
    #[serde(default)]
    pub do_sample: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_beams: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_stopping: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_penalty: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_new_tokens: Option<u32>,
}

impl DecodingParams {
    /// Plain stochastic sampling, used for open-ended questions
    pub fn question_default() -> Self {
        Self {
            do_sample: true,
            ..Self::default()
        }
    }

    /// Deterministic beam search for single answers
    pub fn answer_default() -> Self {
        Self {
            do_sample: false,
            num_beams: Some(8),
            early_stopping: Some(true),
            length_penalty: Some(1.0),
            max_new_tokens: Some(64),
            ..Self::default()
        }
    }

    /// Sampled beam search for batched answers
    pub fn batch_answer_default() -> Self {
        Self {
            do_sample: true,
            num_beams: Some(5),
            early_stopping: Some(true),
            length_penalty: Some(1.2),
            temperature: Some(0.7),
            top_k: Some(50),
            top_p: Some(0.9),
            max_new_tokens: Some(64),
        }
    }

    /// True when beam search options are present
    pub fn uses_beams(&self) -> bool {
        self.num_beams.map(|n| n > 1).unwrap_or(false)
    }
}

/// Result of asking a backend for one piece of text
#[derive(Debug)]
pub enum GenerationOutcome {
    /// Generated text, trimmed
    Success(String),
    /// The backend answered without a text field; carries the raw record
    FormatError(String),
    /// The backend could not be invoked
    InvocationError(QagenError),
}

impl GenerationOutcome {
    /// Classify one raw result record
    ///
    /// ```
    /// use qagen_core::ai::GenerationOutcome;
    /// use serde_json::json;
    ///
    /// let ok = GenerationOutcome::from_record(&json!({"generated_text": " What? "}));
    /// assert_eq!(ok.into_result().unwrap(), "What?");
    ///
    /// let bad = GenerationOutcome::from_record(&json!({"text": "What?"}));
    /// assert!(bad.into_result().is_err());
    /// ```
    pub fn from_record(record: &Value) -> Self {
        match record.get("generated_text").and_then(Value::as_str) {
            Some(text) => Self::Success(text.trim().to_string()),
            None => Self::FormatError(record.to_string()),
        }
    }

    /// Classify the result of a single-prompt invocation
    pub fn from_invocation(result: Result<Vec<Value>>) -> Self {
        match result {
            Ok(records) => match records.first() {
                Some(record) => Self::from_record(record),
                None => Self::FormatError("[]".to_string()),
            },
            Err(err) => Self::InvocationError(err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Convert into a `Result`, mapping format errors to `UnexpectedOutputFormat`
    pub fn into_result(self) -> Result<String> {
        match self {
            Self::Success(text) => Ok(text),
            Self::FormatError(raw) => Err(QagenError::unexpected_output(raw)),
            Self::InvocationError(err) => Err(err),
        }
    }
}

/// Classify the records of a multi-prompt invocation
///
/// The record count must match the prompt count; anything else is a format
/// error for the whole batch.
pub fn classify_batch(result: Result<Vec<Value>>, expected: usize) -> Result<Vec<GenerationOutcome>> {
    let records = result?;
    if records.len() != expected {
        return Err(QagenError::unexpected_output(format!(
            "expected {} results, got {}: {}",
            expected,
            records.len(),
            Value::Array(records)
        )));
    }
    Ok(records.iter().map(GenerationOutcome::from_record).collect())
}

/// A text-to-text model exposed by an external service
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short backend name for logs and errors
    fn name(&self) -> &str;

    /// Run the model over each prompt and return one raw record per prompt
    ///
    /// A well-formed record carries a `generated_text` string. Transport
    /// failures are returned as `Err`.
    async fn generate(&self, prompts: &[String], params: &DecodingParams) -> Result<Vec<Value>>;

    /// Whether the backend is reachable
    async fn health_check(&self) -> bool {
        true
    }
}

/// Map a reqwest transport error for `service` into a collaborator error
pub(crate) fn transport_error(service: &str, err: reqwest::Error) -> QagenError {
    if err.is_timeout() {
        QagenError::timeout(format!("{} request", service))
    } else {
        QagenError::unavailable(service, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn test_decoding_defaults() {
        let q = DecodingParams::question_default();
        assert!(q.do_sample);
        assert!(!q.uses_beams());

        let a = DecodingParams::answer_default();
        assert!(!a.do_sample);
        assert_eq!(a.num_beams, Some(8));
        assert_eq!(a.max_new_tokens, Some(64));
        assert!(a.uses_beams());

        let b = DecodingParams::batch_answer_default();
        assert_eq!(b.num_beams, Some(5));
        assert_eq!(b.length_penalty, Some(1.2));
    }

    #[test]
    fn test_decoding_serialization_skips_unset() {
        let json = serde_json::to_value(DecodingParams::question_default()).unwrap();
        assert_eq!(json, json!({"do_sample": true}));
    }

    #[test]
    fn test_outcome_from_invocation() {
        let outcome = GenerationOutcome::from_invocation(Ok(vec![]));
        assert_matches!(outcome, GenerationOutcome::FormatError(_));

        let outcome =
            GenerationOutcome::from_invocation(Err(QagenError::unavailable("t2t", "refused")));
        assert_matches!(
            outcome.into_result(),
            Err(QagenError::CollaboratorUnavailable { .. })
        );
    }

    #[test]
    fn test_format_error_maps_to_unexpected_output() {
        let outcome = GenerationOutcome::from_record(&json!({"generated_text": 42}));
        assert!(!outcome.is_success());
        assert_matches!(
            outcome.into_result(),
            Err(QagenError::UnexpectedOutputFormat { .. })
        );
    }

    #[test]
    fn test_classify_batch_length_mismatch() {
        let records = vec![json!({"generated_text": "a"})];
        let result = classify_batch(Ok(records), 2);
        assert_matches!(result, Err(QagenError::UnexpectedOutputFormat { .. }));
    }

    #[test]
    fn test_classify_batch() {
        let records = vec![json!({"generated_text": "a"}), json!({"oops": true})];
        let outcomes = classify_batch(Ok(records), 2).unwrap();
        assert!(outcomes[0].is_success());
        assert!(!outcomes[1].is_success());
    }
}
