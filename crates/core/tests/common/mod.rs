//! Common test helpers for pipeline integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use qagen_core::ai::{DecodingParams, TextGenerator};
use qagen_core::semantic::{Embedder, EmbeddingError};
use qagen_core::{QagenError, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const ECOTANK: &str = "The EcoTank system drastically reduces printing costs.";

/// What a prompt asks the model for
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    Question { context: String },
    Answer { context: String, question: String },
}

impl Prompt {
    /// Recover the prompt kind and its inputs from the rendered templates
    pub fn parse(prompt: &str) -> Self {
        let after_context = prompt.split("Context: ").nth(1).unwrap_or_default();
        let mut parts = after_context.splitn(2, "\n\nQuestion:");
        let context = parts.next().unwrap_or_default().trim().to_string();
        let rest = parts.next().unwrap_or_default();

        match rest.split_once("\n\nAnswer:") {
            Some((question, _)) => Prompt::Answer {
                context,
                question: question.trim().to_string(),
            },
            None => Prompt::Question { context },
        }
    }
}

/// Generation backend driven by a closure over the parsed prompt
///
/// Returning `None` yields a record without `generated_text`.
pub struct FnBackend<F>(pub F);

#[async_trait]
impl<F> TextGenerator for FnBackend<F>
where
    F: Fn(Prompt) -> Option<String> + Send + Sync,
{
    fn name(&self) -> &str {
        "fn"
    }

    async fn generate(&self, prompts: &[String], _params: &DecodingParams) -> Result<Vec<Value>> {
        Ok(prompts
            .iter()
            .map(|prompt| match (self.0)(Prompt::parse(prompt)) {
                Some(text) => json!({ "generated_text": text }),
                None => json!({ "error": "no text" }),
            })
            .collect())
    }
}

/// Answers with the context itself, asks a fixed question per context
pub fn echo_backend(questions: HashMap<String, String>) -> FnBackend<impl Fn(Prompt) -> Option<String>> {
    FnBackend(move |prompt: Prompt| match prompt {
        Prompt::Question { context } => Some(
            questions
                .get(&context)
                .cloned()
                .unwrap_or_else(|| "What is described here?".to_string()),
        ),
        Prompt::Answer { context, .. } => Some(context),
    })
}

/// Backend that records how many calls are in flight at once
#[derive(Default)]
pub struct InFlightBackend {
    current: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
}

impl InFlightBackend {
    /// Highest number of overlapping `generate` calls seen
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for InFlightBackend {
    fn name(&self) -> &str {
        "in-flight"
    }

    async fn generate(&self, prompts: &[String], _params: &DecodingParams) -> Result<Vec<Value>> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(20)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);

        Ok(prompts
            .iter()
            .map(|prompt| match Prompt::parse(prompt) {
                Prompt::Question { .. } => json!({ "generated_text": "What does the EcoTank system reduce?" }),
                Prompt::Answer { context, .. } => json!({ "generated_text": context }),
            })
            .collect())
    }
}

/// Embeds known texts to fixed vectors
pub struct TableEmbedder(pub HashMap<String, Vec<f32>>);

#[async_trait]
impl Embedder for TableEmbedder {
    fn name(&self) -> &str {
        "table"
    }

    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
        self.0
            .get(text)
            .cloned()
            .ok_or_else(|| EmbeddingError::Backend(format!("no embedding for '{}'", text)))
    }
}

/// Status code a service would answer with for `result`
pub fn status_of<T>(result: &std::result::Result<T, QagenError>) -> u16 {
    match result {
        Ok(_) => 200,
        Err(e) => e.status_code(),
    }
}
