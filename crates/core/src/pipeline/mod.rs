//! End-to-end question/answer pipeline
//!
//! [`QaPipeline`] owns one handle to every stage and collaborator. It is
//! built once at startup (see [`PipelineBuilder`]) and shared read-only by
//! all requests.
//!
//! Each request gets a [`ProcessCode`] recorded on its tracing span so the
//! log lines of one request can be correlated.

use crate::ai::QaGenerator;
use crate::chunking::{ChunkStrategy, Chunker};
use crate::config::{FailurePolicy, GenerationMode, QagenConfig};
use crate::error::{QagenError, Result};
use crate::preprocess::Preprocessor;
use crate::quality::QualityEvaluator;
use crate::translate::{translate_or_passthrough, Language, Translator};
use crate::types::{ContextInput, GeneratedQa, ProcessCode};
use crate::validation::QaCurator;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

pub mod builder;

pub use builder::PipelineBuilder;

/// Orchestration settings
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub mode: GenerationMode,
    /// Contexts processed at the same time in concurrent mode
    pub max_concurrency: usize,
    pub failure_policy: FailurePolicy,
    /// Pairs are kept only when their quality is strictly above this
    pub min_quality: f64,
}

impl PipelineSettings {
    pub fn from_config(config: &QagenConfig) -> Self {
        Self {
            mode: config.generation.mode,
            max_concurrency: config.generation.max_concurrency.max(1),
            failure_policy: config.generation.failure_policy,
            min_quality: config.quality.min_quality,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&QagenConfig::default())
    }
}

/// A context ready for generation, paired with the caller's text
#[derive(Debug, Clone)]
struct PreparedContext {
    original: String,
    context: String,
}

/// The question/answer generation and curation pipeline
pub struct QaPipeline {
    preprocessor: Preprocessor,
    chunker: Chunker,
    generator: QaGenerator,
    evaluator: QualityEvaluator,
    curator: QaCurator,
    translator: Option<Arc<dyn Translator>>,
    settings: PipelineSettings,
}

impl std::fmt::Debug for QaPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QaPipeline")
            .field("chunker", &self.chunker)
            .field("generator", &self.generator)
            .field("curator", &self.curator)
            .field("translator", &self.translator.as_ref().map(|t| t.name().to_string()))
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl QaPipeline {
    pub fn new(
        chunker: Chunker,
        generator: QaGenerator,
        evaluator: QualityEvaluator,
        curator: QaCurator,
        translator: Option<Arc<dyn Translator>>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            preprocessor: Preprocessor::new(),
            chunker,
            generator,
            evaluator,
            curator,
            translator,
            settings,
        }
    }

    /// Build a pipeline with the collaborators named in `config`
    pub fn from_config(config: &QagenConfig) -> Result<Self> {
        PipelineBuilder::new(config.clone()).build()
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    pub fn generator(&self) -> &QaGenerator {
        &self.generator
    }

    pub fn evaluator(&self) -> &QualityEvaluator {
        &self.evaluator
    }

    pub fn curator(&self) -> &QaCurator {
        &self.curator
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Whether the generation backend is reachable
    pub async fn health_check(&self) -> bool {
        self.generator.health_check().await
    }

    /// Normalize `text` and split it with the configured strategy
    pub fn preprocess_and_chunk(&self, text: &str) -> Result<Vec<String>> {
        self.preprocess_and_chunk_with(text, self.chunker.settings().strategy)
    }

    /// Normalize `text` and split it with `strategy`
    ///
    /// # Errors
    ///
    /// `EmptyInput` when nothing usable remains.
    pub fn preprocess_and_chunk_with(&self, text: &str, strategy: ChunkStrategy) -> Result<Vec<String>> {
        let cleaned = self
            .preprocessor
            .clean_non_empty(text)
            .ok_or_else(|| QagenError::empty_input("text is empty after preprocessing"))?;

        let chunks: Vec<String> = self
            .chunker
            .chunk_with(&cleaned, strategy)?
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .collect();

        if chunks.is_empty() {
            return Err(QagenError::empty_input("chunking produced no usable chunks"));
        }
        Ok(chunks)
    }

    /// Generate and score one pair per context
    ///
    /// Contexts are used as given, without chunking. Returned pairs carry
    /// the caller's original context text.
    pub async fn generate(&self, contexts: Vec<String>) -> Result<Vec<GeneratedQa>> {
        let code = ProcessCode::new();
        self.generate_contexts(contexts)
            .instrument(info_span!("generate_qa", process = %code))
            .await
    }

    /// Validate, deduplicate and rank pairs
    pub async fn validate_and_deduplicate(&self, qas: Vec<GeneratedQa>) -> Result<Vec<GeneratedQa>> {
        let code = ProcessCode::new();
        self.curator
            .validate_and_deduplicate(qas)
            .instrument(info_span!("validate_and_deduplicate", process = %code))
            .await
    }

    /// Chunk when needed, generate, then validate
    ///
    /// A single text is chunked; a list is taken as already chunked.
    pub async fn run(&self, input: ContextInput) -> Result<Vec<GeneratedQa>> {
        let code = ProcessCode::new();
        let span = info_span!("run", process = %code);

        async move {
            if input.is_blank() {
                return Err(QagenError::empty_input("context is empty"));
            }
            let contexts = match input {
                ContextInput::Text(text) => self.preprocess_and_chunk(&text)?,
                ContextInput::Chunks(chunks) => chunks,
            };
            info!(contexts = contexts.len(), "Running pipeline");

            let qas = self.generate_contexts(contexts).await?;
            self.curator.validate_and_deduplicate(qas).await
        }
        .instrument(span)
        .await
    }

    async fn generate_contexts(&self, originals: Vec<String>) -> Result<Vec<GeneratedQa>> {
        let first = originals
            .first()
            .ok_or_else(|| QagenError::empty_input("no contexts provided"))?;

        let language = self.detect_language(first).await;
        let translated = self.translate_all(&originals, language, Language::English).await;

        let prepared: Vec<PreparedContext> = originals
            .into_iter()
            .zip(translated)
            .filter_map(|(original, text)| {
                self.preprocessor
                    .clean_non_empty(&text)
                    .map(|context| PreparedContext { original, context })
            })
            .collect();

        if prepared.is_empty() {
            return Err(QagenError::empty_input("all contexts are empty after preprocessing"));
        }

        info!(
            contexts = prepared.len(),
            language = %language,
            mode = ?self.settings.mode,
            "Generating question/answer pairs"
        );

        let qas = match self.settings.mode {
            GenerationMode::Concurrent => self.generate_concurrent(prepared, language).await?,
            GenerationMode::Batched => self.generate_batched(prepared, language).await?,
        };

        info!(kept = qas.len(), "Generation finished");
        Ok(qas)
    }

    async fn detect_language(&self, text: &str) -> Language {
        let Some(translator) = &self.translator else {
            return Language::English;
        };
        if text.trim().is_empty() {
            return Language::English;
        }
        match translator.detect_language(text).await {
            Ok(language) => language,
            Err(e) => {
                warn!(error = %e, "Language detection failed, assuming English");
                Language::English
            }
        }
    }

    async fn translate_all(&self, texts: &[String], from: Language, to: Language) -> Vec<String> {
        let translator = match &self.translator {
            Some(translator) if from != to => translator.as_ref(),
            _ => return texts.to_vec(),
        };
        info!(from = %from, to = %to, count = texts.len(), "Translating contexts");

        stream::iter(texts.iter().cloned())
            .map(|text| async move { translate_or_passthrough(translator, &text, from, to).await })
            .buffered(self.settings.max_concurrency)
            .collect()
            .await
    }

    async fn translate_back(&self, text: String, language: Language) -> String {
        match &self.translator {
            Some(translator) if language != Language::English => {
                translate_or_passthrough(translator.as_ref(), &text, Language::English, language).await
            }
            _ => text,
        }
    }

    /// Question, then answer, then score for each context, several contexts at once
    async fn generate_concurrent(
        &self,
        prepared: Vec<PreparedContext>,
        language: Language,
    ) -> Result<Vec<GeneratedQa>> {
        let total = prepared.len();
        let policy = self.settings.failure_policy;

        let mut outcomes = stream::iter(prepared.into_iter().enumerate())
            .map(|(index, item)| async move {
                let result = self.process_context(&item, language).await;
                (index, item, result)
            })
            .buffered(self.settings.max_concurrency);

        let mut qas = Vec::with_capacity(total);
        let mut failures = Vec::new();

        while let Some((index, item, result)) = outcomes.next().await {
            match result {
                Ok(Some(qa)) => qas.push(qa),
                Ok(None) => {}
                Err(e) => {
                    if policy == FailurePolicy::Abort {
                        error!(chunk = index, error = %e, "Generation failed, aborting request");
                        return Err(e);
                    }
                    warn!(
                        chunk = index,
                        error = %e,
                        category = %e.category(),
                        policy = ?policy,
                        "Generation failed for chunk"
                    );
                    if policy == FailurePolicy::Placeholder {
                        qas.push(GeneratedQa::new(item.original, "", ""));
                    }
                    failures.push(e);
                }
            }
        }

        // Nothing was generated at all: report why instead of an empty success
        if failures.len() == total {
            if let Some(first) = failures.into_iter().next() {
                return Err(first);
            }
        }

        Ok(qas)
    }

    /// One multi-prompt call for all questions, then one for all answers
    async fn generate_batched(
        &self,
        prepared: Vec<PreparedContext>,
        language: Language,
    ) -> Result<Vec<GeneratedQa>> {
        let contexts: Vec<String> = prepared.iter().map(|p| p.context.clone()).collect();
        let questions = self.generator.generate_questions_batch(&contexts).await?;
        let answers = self.generator.generate_answers_batch(&questions, &contexts).await?;

        let kept: Vec<Option<GeneratedQa>> = stream::iter(prepared.into_iter().zip(questions).zip(answers))
            .map(|((item, question), answer)| async move {
                self.finish_pair(&item, question, answer, language).await
            })
            .buffered(self.settings.max_concurrency)
            .try_collect()
            .await?;

        Ok(kept.into_iter().flatten().collect())
    }

    async fn process_context(&self, item: &PreparedContext, language: Language) -> Result<Option<GeneratedQa>> {
        let question = self.generator.generate_question(&item.context).await?;
        let answer = self.generator.generate_answer(&question, &item.context).await?;
        self.finish_pair(item, question, answer, language).await
    }

    /// Score a generated pair and decide whether to keep it
    ///
    /// An empty answer is kept unscored with quality zero.
    async fn finish_pair(
        &self,
        item: &PreparedContext,
        question: String,
        answer: String,
        language: Language,
    ) -> Result<Option<GeneratedQa>> {
        if answer.trim().is_empty() {
            debug!(question = %question, "Empty answer, keeping zero-quality placeholder");
            return Ok(Some(
                GeneratedQa::new(item.original.clone(), question, answer).with_quality(0.0),
            ));
        }

        let quality = self.evaluator.score(&item.context, &question, &answer).await?;
        if quality <= self.settings.min_quality {
            debug!(quality, threshold = self.settings.min_quality, "Pair below quality threshold");
            return Ok(None);
        }

        let question = self.translate_back(question, language).await;
        let answer = self.translate_back(answer, language).await;

        info!(quality, question = %question, "Generated pair");
        Ok(Some(
            GeneratedQa::new(item.original.clone(), question, answer).with_quality(quality),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{DecodingParams, TextGenerator};
    use crate::config::QagenConfig;
    use crate::translate::IdentityTranslator;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    const CONTEXT: &str = "The EcoTank system drastically reduces printing costs.";

    /// Questions and answers keyed on the prompt kind; contexts containing
    /// "FAIL" make the backend error
    struct ScriptedBackend {
        answer: String,
        calls: Mutex<usize>,
    }

    impl ScriptedBackend {
        fn new(answer: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: answer.to_string(),
                calls: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedBackend {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompts: &[String], _params: &DecodingParams) -> Result<Vec<Value>> {
            *self.calls.lock() += 1;
            prompts
                .iter()
                .map(|prompt| {
                    if prompt.contains("FAIL") {
                        Err(QagenError::unavailable("scripted", "refused"))
                    } else if prompt.trim_end().ends_with("Answer:") {
                        Ok(json!({ "generated_text": self.answer }))
                    } else {
                        Ok(json!({ "generated_text": "What does the EcoTank system reduce?" }))
                    }
                })
                .collect()
        }
    }

    /// Always reports Spanish and tags translated text with its direction
    struct TaggingTranslator;

    #[async_trait]
    impl Translator for TaggingTranslator {
        fn name(&self) -> &str {
            "tagging"
        }

        async fn detect_language(&self, _text: &str) -> Result<Language> {
            Ok(Language::Spanish)
        }

        async fn translate(&self, text: &str, from: Language, to: Language) -> Result<String> {
            match (from, to) {
                (Language::Spanish, Language::English) => Ok(CONTEXT.to_string()),
                _ => Ok(format!("[{}] {}", to, text)),
            }
        }
    }

    fn pipeline_with(backend: Arc<dyn TextGenerator>, config: QagenConfig) -> QaPipeline {
        PipelineBuilder::new(config)
            .with_generator(backend)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_generate_keeps_good_pair_with_original_context() {
        let pipeline = pipeline_with(
            ScriptedBackend::new("The EcoTank system drastically reduces printing costs."),
            QagenConfig::default(),
        );
        let qas = pipeline.generate(vec![CONTEXT.to_string()]).await.unwrap();
        assert_eq!(qas.len(), 1);
        assert_eq!(qas[0].context, CONTEXT);
        assert!(qas[0].quality.unwrap() > 0.3);
    }

    #[tokio::test]
    async fn test_empty_answer_is_zero_quality_placeholder() {
        let pipeline = pipeline_with(ScriptedBackend::new("   "), QagenConfig::default());
        let qas = pipeline.generate(vec![CONTEXT.to_string()]).await.unwrap();
        assert_eq!(qas.len(), 1);
        assert_eq!(qas[0].quality, Some(0.0));
    }

    #[tokio::test]
    async fn test_blank_contexts_are_empty_input() {
        let pipeline = pipeline_with(ScriptedBackend::new("x"), QagenConfig::default());
        assert_matches!(
            pipeline.generate(vec!["  ".to_string(), "{}[]".to_string()]).await,
            Err(QagenError::EmptyInput { .. })
        );
        assert_matches!(pipeline.generate(vec![]).await, Err(QagenError::EmptyInput { .. }));
    }

    #[tokio::test]
    async fn test_failure_policies() {
        let contexts = vec![CONTEXT.to_string(), "FAIL this chunk please.".to_string()];
        let answer = "The EcoTank system drastically reduces printing costs.";

        let mut config = QagenConfig::default();
        config.generation.failure_policy = FailurePolicy::Placeholder;
        let qas = pipeline_with(ScriptedBackend::new(answer), config.clone())
            .generate(contexts.clone())
            .await
            .unwrap();
        assert_eq!(qas.len(), 2);
        assert_eq!(qas[1].context, "FAIL this chunk please.");
        assert!(qas[1].quality.is_none());

        config.generation.failure_policy = FailurePolicy::Drop;
        let qas = pipeline_with(ScriptedBackend::new(answer), config.clone())
            .generate(contexts.clone())
            .await
            .unwrap();
        assert_eq!(qas.len(), 1);

        config.generation.failure_policy = FailurePolicy::Abort;
        assert_matches!(
            pipeline_with(ScriptedBackend::new(answer), config)
                .generate(contexts)
                .await,
            Err(QagenError::CollaboratorUnavailable { .. })
        );
    }

    #[tokio::test]
    async fn test_every_chunk_failing_reports_the_error() {
        let pipeline = pipeline_with(ScriptedBackend::new("x"), QagenConfig::default());
        assert_matches!(
            pipeline.generate(vec!["FAIL one.".to_string()]).await,
            Err(QagenError::CollaboratorUnavailable { .. })
        );
    }

    #[tokio::test]
    async fn test_batched_mode_uses_two_calls() {
        let backend = ScriptedBackend::new("The EcoTank system drastically reduces printing costs.");
        let mut config = QagenConfig::default();
        config.generation.mode = GenerationMode::Batched;
        let pipeline = pipeline_with(backend.clone(), config);

        let qas = pipeline
            .generate(vec![CONTEXT.to_string(), CONTEXT.to_string()])
            .await
            .unwrap();
        assert_eq!(qas.len(), 2);
        assert_eq!(*backend.calls.lock(), 2);
    }

    #[tokio::test]
    async fn test_batched_mode_aborts_on_failure() {
        let mut config = QagenConfig::default();
        config.generation.mode = GenerationMode::Batched;
        let pipeline = pipeline_with(ScriptedBackend::new("x"), config);
        assert!(pipeline
            .generate(vec![CONTEXT.to_string(), "FAIL".to_string()])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_spanish_round_trip() {
        let pipeline = PipelineBuilder::new(QagenConfig::default())
            .with_generator(ScriptedBackend::new(
                "The EcoTank system drastically reduces printing costs.",
            ))
            .with_translator(Arc::new(TaggingTranslator))
            .build()
            .unwrap();

        let original = "El sistema EcoTank reduce drásticamente los costos de impresión.";
        let qas = pipeline.generate(vec![original.to_string()]).await.unwrap();
        assert_eq!(qas.len(), 1);
        assert_eq!(qas[0].context, original);
        assert!(qas[0].question.starts_with("[es] "));
        assert!(qas[0].answer.starts_with("[es] "));
    }

    #[tokio::test]
    async fn test_translation_disabled_skips_detection() {
        let mut config = QagenConfig::default();
        config.translation.enabled = false;
        let pipeline = PipelineBuilder::new(config)
            .with_generator(ScriptedBackend::new(
                "The EcoTank system drastically reduces printing costs.",
            ))
            .with_translator(Arc::new(TaggingTranslator))
            .build()
            .unwrap();

        let qas = pipeline.generate(vec![CONTEXT.to_string()]).await.unwrap();
        assert!(!qas[0].question.starts_with("[es]"));
    }

    #[tokio::test]
    async fn test_identity_translator_keeps_english() {
        let pipeline = PipelineBuilder::new(QagenConfig::default())
            .with_generator(ScriptedBackend::new(
                "The EcoTank system drastically reduces printing costs.",
            ))
            .with_translator(Arc::new(IdentityTranslator))
            .build()
            .unwrap();
        let qas = pipeline.generate(vec![CONTEXT.to_string()]).await.unwrap();
        assert_eq!(qas[0].question, "What does the EcoTank system reduce?");
    }

    #[tokio::test]
    async fn test_run_chunks_single_text() {
        let pipeline = pipeline_with(
            ScriptedBackend::new("The EcoTank system drastically reduces printing costs."),
            QagenConfig::default(),
        );
        let qas = pipeline.run(ContextInput::from(CONTEXT)).await.unwrap();
        assert_eq!(qas.len(), 1);
        assert_matches!(
            pipeline.run(ContextInput::from("   ")).await,
            Err(QagenError::EmptyInput { .. })
        );
    }

    #[test]
    fn test_preprocess_and_chunk_rejects_blank_text() {
        let pipeline = pipeline_with(ScriptedBackend::new("x"), QagenConfig::default());
        assert_matches!(
            pipeline.preprocess_and_chunk("<> {} []"),
            Err(QagenError::EmptyInput { .. })
        );
        let chunks = pipeline.preprocess_and_chunk(CONTEXT).unwrap();
        assert_eq!(chunks, vec![CONTEXT.to_string()]);
    }
}
