//! Question and answer generation on top of a [`TextGenerator`]

use super::{classify_batch, DecodingParams, GenerationOutcome, PromptLibrary, TextGenerator};
use crate::config::GenerationConfig;
use crate::error::{QagenError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Generates questions and answers for preprocessed contexts
///
/// Failures are never retried here; they are returned to the caller, which
/// decides whether to substitute a placeholder or abort.
#[derive(Clone)]
pub struct QaGenerator {
    backend: Arc<dyn TextGenerator>,
    prompts: PromptLibrary,
    question_params: DecodingParams,
    answer_params: DecodingParams,
    batch_answer_params: DecodingParams,
    timeout: Duration,
}

impl std::fmt::Debug for QaGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaGenerator")
            .field("backend", &self.backend.name())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl QaGenerator {
    pub fn new(
        backend: Arc<dyn TextGenerator>,
        prompts: PromptLibrary,
        config: &GenerationConfig,
    ) -> Self {
        Self {
            backend,
            prompts,
            question_params: config.question.clone(),
            answer_params: config.answer.clone(),
            batch_answer_params: config.batch_answer.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    /// Override the per-call deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Whether the generation backend is reachable
    pub async fn health_check(&self) -> bool {
        self.backend.health_check().await
    }

    async fn with_deadline<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(QagenError::timeout(operation)),
        }
    }

    /// Generate one open-ended question for `context`
    pub async fn generate_question(&self, context: &str) -> Result<String> {
        if context.trim().is_empty() {
            return Err(QagenError::EmptyContext);
        }

        let prompt = self.prompts.question_prompt(context)?;
        let result = self
            .with_deadline(
                "question generation",
                self.backend.generate(&[prompt], &self.question_params),
            )
            .await;
        let question = GenerationOutcome::from_invocation(result).into_result()?;

        debug!(
            stage = "QG",
            context_chars = context.len(),
            question_chars = question.len(),
            "Generated question"
        );
        Ok(question)
    }

    /// Generate an answer to `question` grounded in `context`
    pub async fn generate_answer(&self, question: &str, context: &str) -> Result<String> {
        if context.trim().is_empty() {
            return Err(QagenError::EmptyContext);
        }

        let prompt = self.prompts.answer_prompt(question, context)?;
        let result = self
            .with_deadline(
                "answer generation",
                self.backend.generate(&[prompt], &self.answer_params),
            )
            .await;
        let answer = GenerationOutcome::from_invocation(result).into_result()?;

        debug!(
            stage = "AG",
            question_chars = question.len(),
            answer_chars = answer.len(),
            "Generated answer"
        );
        Ok(answer)
    }

    /// Generate one question per context in a single backend call
    pub async fn generate_questions_batch(&self, contexts: &[String]) -> Result<Vec<String>> {
        if contexts.is_empty() {
            return Ok(Vec::new());
        }
        if contexts.iter().any(|c| c.trim().is_empty()) {
            return Err(QagenError::EmptyContext);
        }

        let prompts = contexts
            .iter()
            .map(|c| self.prompts.question_prompt(c))
            .collect::<Result<Vec<_>>>()?;

        info!(stage = "BATCH-QG", contexts = prompts.len(), "Generating questions");
        let result = self
            .with_deadline(
                "batch question generation",
                self.backend.generate(&prompts, &self.question_params),
            )
            .await;

        classify_batch(result, prompts.len())?
            .into_iter()
            .map(GenerationOutcome::into_result)
            .collect()
    }

    /// Generate answers for paired questions and contexts in a single call
    ///
    /// Both lists must have the same length.
    pub async fn generate_answers_batch(
        &self,
        questions: &[String],
        contexts: &[String],
    ) -> Result<Vec<String>> {
        if questions.len() != contexts.len() {
            return Err(QagenError::precondition(format!(
                "questions and contexts must have the same length ({} != {})",
                questions.len(),
                contexts.len()
            )));
        }
        if contexts.is_empty() {
            return Ok(Vec::new());
        }
        if contexts.iter().any(|c| c.trim().is_empty()) {
            return Err(QagenError::EmptyContext);
        }

        let prompts = questions
            .iter()
            .zip(contexts)
            .map(|(q, c)| self.prompts.answer_prompt(q, c))
            .collect::<Result<Vec<_>>>()?;

        info!(stage = "BATCH-AG", pairs = prompts.len(), "Generating answers");
        let result = self
            .with_deadline(
                "batch answer generation",
                self.backend.generate(&prompts, &self.batch_answer_params),
            )
            .await;

        classify_batch(result, prompts.len())?
            .into_iter()
            .map(GenerationOutcome::into_result)
            .collect()
    }
}
