//! Construction of a [`QaPipeline`] from configuration
//!
//! Every collaborator can be replaced before `build`, which is how tests
//! and embedders plug in scripted backends.

use super::{PipelineSettings, QaPipeline};
use crate::ai::{OllamaClient, OllamaGenerator, PromptLibrary, QaGenerator, Text2TextClient, TextGenerator};
use crate::chunking::{Chunker, ChunkerSettings};
use crate::config::{
    EmbeddingBackend, EmbeddingConfig, GeneratorBackend, GrammarBackend, ModelConfig, QagenConfig,
    QualityConfig, TranslationConfig, TranslatorBackend,
};
use crate::error::Result;
use crate::quality::{
    EntityExtractor, GrammarChecker, HeuristicEntityExtractor, LanguageToolClient, QualityEvaluator,
    RuleBasedGrammarChecker,
};
use crate::semantic::{Embedder, HashingEmbedder, OllamaEmbedder};
use crate::tokenizer::Tokenizer;
use crate::translate::{IdentityTranslator, TranslationServiceClient, Translator};
use crate::validation::QaCurator;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Builder for [`QaPipeline`]
pub struct PipelineBuilder {
    config: QagenConfig,
    generator: Option<Arc<dyn TextGenerator>>,
    tokenizer: Option<Arc<dyn Tokenizer>>,
    embedder: Option<Arc<dyn Embedder>>,
    grammar: Option<Arc<dyn GrammarChecker>>,
    entities: Option<Arc<dyn EntityExtractor>>,
    translator: Option<Arc<dyn Translator>>,
}

impl PipelineBuilder {
    pub fn new(config: QagenConfig) -> Self {
        Self {
            config,
            generator: None,
            tokenizer: None,
            embedder: None,
            grammar: None,
            entities: None,
            translator: None,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_grammar_checker(mut self, grammar: Arc<dyn GrammarChecker>) -> Self {
        self.grammar = Some(grammar);
        self
    }

    pub fn with_entity_extractor(mut self, entities: Arc<dyn EntityExtractor>) -> Self {
        self.entities = Some(entities);
        self
    }

    /// Use this translator when translation is enabled in the configuration
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Validate the configuration and assemble the pipeline
    pub fn build(self) -> Result<QaPipeline> {
        let config = self.config;
        config.validate()?;

        let profile = config.model.profile();
        let chunker = match self.tokenizer {
            Some(tokenizer) => Chunker::new(tokenizer, ChunkerSettings::resolve(&config.chunking, &profile)),
            None => Chunker::from_config(&config.chunking, &profile)?,
        };

        let backend = match self.generator {
            Some(generator) => generator,
            None => build_generator(&config.model)?,
        };
        let prompts = PromptLibrary::with_overrides(&config.generation.prompts)?;
        let generator = QaGenerator::new(backend, prompts, &config.generation);

        let grammar = match self.grammar {
            Some(grammar) => grammar,
            None => build_grammar_checker(&config.quality)?,
        };
        let entities = self
            .entities
            .unwrap_or_else(|| Arc::new(HeuristicEntityExtractor));
        let evaluator = QualityEvaluator::new(entities, grammar)
            .with_grammar_error_scale(config.quality.grammar_error_scale);

        let embedder = match self.embedder {
            Some(embedder) => embedder,
            None => build_embedder(&config.embeddings)?,
        };
        let curator = QaCurator::from_config(&config.validation, embedder);

        let translator = if config.translation.enabled {
            Some(match self.translator {
                Some(translator) => translator,
                None => build_translator(&config.translation)?,
            })
        } else {
            None
        };

        info!(
            model = %config.model.name,
            generator = generator.backend_name(),
            strategy = %chunker.settings().strategy,
            translation = translator.as_ref().map(|t| t.name().to_string()),
            "Pipeline ready"
        );

        Ok(QaPipeline::new(
            chunker,
            generator,
            evaluator,
            curator,
            translator,
            PipelineSettings::from_config(&config),
        ))
    }
}

fn build_generator(model: &ModelConfig) -> Result<Arc<dyn TextGenerator>> {
    let timeout = Duration::from_secs(model.timeout_seconds);
    Ok(match model.backend {
        GeneratorBackend::Text2text => Arc::new(Text2TextClient::new(model.url.as_str(), timeout)?),
        GeneratorBackend::Ollama => Arc::new(OllamaGenerator::new(
            OllamaClient::with_timeout(model.url.as_str(), timeout)?,
            model.name.clone(),
        )),
    })
}

fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    Ok(match config.backend {
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.dimensions)),
        EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::new(
            OllamaClient::with_timeout(config.url.as_str(), Duration::from_secs(config.timeout_seconds))?,
            config.model.clone(),
        )),
    })
}

fn build_grammar_checker(config: &QualityConfig) -> Result<Arc<dyn GrammarChecker>> {
    Ok(match config.grammar {
        GrammarBackend::RuleBased => Arc::new(RuleBasedGrammarChecker),
        GrammarBackend::LanguageTool => Arc::new(LanguageToolClient::new(
            config.language_tool_url.as_str(),
            config.language.clone(),
            Duration::from_secs(config.timeout_seconds),
        )?),
    })
}

fn build_translator(config: &TranslationConfig) -> Result<Arc<dyn Translator>> {
    Ok(match config.backend {
        TranslatorBackend::Identity => Arc::new(IdentityTranslator),
        TranslatorBackend::Service => Arc::new(TranslationServiceClient::new(
            config.url.as_str(),
            Duration::from_secs(config.timeout_seconds),
        )?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationMode;
    use crate::error::QagenError;
    use assert_matches::assert_matches;

    #[test]
    fn test_build_from_default_config() {
        let pipeline = PipelineBuilder::new(QagenConfig::default()).build().unwrap();
        assert_eq!(pipeline.generator().backend_name(), "text2text");
        assert_eq!(pipeline.settings().mode, GenerationMode::Concurrent);
        assert_eq!(pipeline.settings().max_concurrency, 5);
    }

    #[test]
    fn test_build_with_service_backends() {
        let mut config = QagenConfig::default();
        config.model.backend = GeneratorBackend::Ollama;
        config.embeddings.backend = EmbeddingBackend::Ollama;
        config.quality.grammar = GrammarBackend::LanguageTool;
        config.translation.backend = TranslatorBackend::Service;

        let pipeline = PipelineBuilder::new(config).build().unwrap();
        assert_eq!(pipeline.generator().backend_name(), "ollama");
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = QagenConfig::default();
        config.generation.max_concurrency = 0;
        assert_matches!(
            PipelineBuilder::new(config).build(),
            Err(QagenError::Validation { .. })
        );
    }
}
