//! Configuration types for the qagen core library

use crate::ai::DecodingParams;
use crate::chunking::ChunkStrategy;
use crate::tokenizer::TokenizerKind;
use crate::{QagenError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable prefix for overrides, e.g. `QAGEN_MODEL__NAME`
pub const ENV_PREFIX: &str = "QAGEN";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QagenConfig {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: String,
    /// Text generation model and backend
    #[serde(default)]
    pub model: ModelConfig,
    /// Chunking settings
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Question/answer generation settings
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Question embeddings used for deduplication
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// Quality scoring settings
    #[serde(default)]
    pub quality: QualityConfig,
    /// Answer validation and deduplication settings
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Language detection and translation
    #[serde(default)]
    pub translation: TranslationConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSettings,
}

impl Default for QagenConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            model: ModelConfig::default(),
            chunking: ChunkingConfig::default(),
            generation: GenerationConfig::default(),
            embeddings: EmbeddingConfig::default(),
            quality: QualityConfig::default(),
            validation: ValidationConfig::default(),
            translation: TranslationConfig::default(),
            logging: LoggingConfig::default(),
            server: ServerSettings::default(),
        }
    }
}

/// Input and output token limits of a text-to-text model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub max_tokens: usize,
    pub recommended_output_tokens: usize,
}

impl ModelProfile {
    pub fn new(max_tokens: usize, recommended_output_tokens: usize) -> Self {
        Self {
            max_tokens,
            recommended_output_tokens,
        }
    }

    /// Known FLAN-T5 limits; unknown models get the `large` profile
    ///
    /// ```
    /// use qagen_core::config::ModelProfile;
    ///
    /// assert_eq!(ModelProfile::for_model("google/flan-t5-base").max_tokens, 256);
    /// assert_eq!(ModelProfile::for_model("google/flan-t5-xxl").recommended_output_tokens, 200);
    /// assert_eq!(ModelProfile::for_model("something-else").max_tokens, 512);
    /// ```
    pub fn for_model(name: &str) -> Self {
        match name {
            "google/flan-t5-small" | "google/flan-t5-base" => Self::new(256, 100),
            "google/flan-t5-xl" | "google/flan-t5-xxl" => Self::new(4096, 200),
            _ => Self::new(512, 100),
        }
    }
}

/// Text generation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorBackend {
    /// HTTP text2text inference service
    #[default]
    Text2text,
    /// Ollama server
    Ollama,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier, also selects the token profile
    #[serde(default = "default_model_name")]
    pub name: String,
    /// Which backend serves the model
    #[serde(default)]
    pub backend: GeneratorBackend,
    /// Base URL of the backend
    #[serde(default = "default_model_url")]
    pub url: Url,
    /// HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Overrides the profile's input token limit
    #[serde(default)]
    pub max_input_tokens: Option<usize>,
    /// Overrides the profile's recommended output tokens
    #[serde(default)]
    pub max_output_tokens: Option<usize>,
}

impl ModelConfig {
    /// Token profile for this model, with overrides applied
    pub fn profile(&self) -> ModelProfile {
        let base = ModelProfile::for_model(&self.name);
        ModelProfile::new(
            self.max_input_tokens.unwrap_or(base.max_tokens),
            self.max_output_tokens
                .unwrap_or(base.recommended_output_tokens),
        )
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            backend: GeneratorBackend::default(),
            url: default_model_url(),
            timeout_seconds: default_timeout(),
            max_input_tokens: None,
            max_output_tokens: None,
        }
    }
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default)]
    pub strategy: ChunkStrategy,
    #[serde(default)]
    pub tokenizer: TokenizerKind,
    /// `tokenizer.json` of the model, used by the pretrained tokenizer
    #[serde(default)]
    pub tokenizer_file: Option<PathBuf>,
    /// Sentences repeated between consecutive chunks
    #[serde(default = "default_overlap_sentences")]
    pub overlap_sentences: usize,
    /// Tokens repeated between consecutive token windows
    #[serde(default = "default_overlap_tokens")]
    pub overlap_tokens: usize,
    /// A trailing sentence chunk below this many tokens is widened backwards
    #[serde(default = "default_min_sentence_chunk_tokens")]
    pub min_sentence_chunk_tokens: usize,
    /// Explicit minimum for a trailing token window
    #[serde(default)]
    pub min_chunk_tokens: Option<usize>,
    /// When no explicit minimum is set, the minimum is the model's input
    /// limit minus this margin
    #[serde(default = "default_min_chunk_margin")]
    pub min_chunk_margin: usize,
    /// Character window for the character strategy, defaults to the
    /// model's input limit
    #[serde(default)]
    pub char_chunk_size: Option<usize>,
    #[serde(default = "default_char_overlap_ratio")]
    pub char_overlap_ratio: f64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::default(),
            tokenizer: TokenizerKind::default(),
            tokenizer_file: None,
            overlap_sentences: default_overlap_sentences(),
            overlap_tokens: default_overlap_tokens(),
            min_sentence_chunk_tokens: default_min_sentence_chunk_tokens(),
            min_chunk_tokens: None,
            min_chunk_margin: default_min_chunk_margin(),
            char_chunk_size: None,
            char_overlap_ratio: default_char_overlap_ratio(),
        }
    }
}

/// How chunks are sent to the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Per-chunk question, answer and score with bounded concurrency
    #[default]
    Concurrent,
    /// One multi-prompt call for all questions, then one for all answers
    Batched,
}

/// What happens to a chunk whose generation fails in concurrent mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Keep a zero-quality placeholder for the chunk
    #[default]
    Placeholder,
    /// Leave the chunk out of the results
    Drop,
    /// Fail the whole request
    Abort,
}

/// Optional prompt template overrides (handlebars)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptOverrides {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

/// Generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub mode: GenerationMode,
    /// Maximum chunks in flight at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Deadline for each collaborator call in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    /// Decoding for question generation
    #[serde(default = "DecodingParams::question_default")]
    pub question: DecodingParams,
    /// Decoding for single answer generation
    #[serde(default = "DecodingParams::answer_default")]
    pub answer: DecodingParams,
    /// Decoding for batched answer generation
    #[serde(default = "DecodingParams::batch_answer_default")]
    pub batch_answer: DecodingParams,
    #[serde(default)]
    pub prompts: PromptOverrides,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            mode: GenerationMode::default(),
            max_concurrency: default_max_concurrency(),
            timeout_seconds: default_timeout(),
            failure_policy: FailurePolicy::default(),
            question: DecodingParams::question_default(),
            answer: DecodingParams::answer_default(),
            batch_answer: DecodingParams::batch_answer_default(),
            prompts: PromptOverrides::default(),
        }
    }
}

/// Embedding backend for question deduplication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local feature hashing, no service needed
    #[default]
    Hashing,
    /// Ollama embeddings endpoint
    Ollama,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: EmbeddingBackend,
    #[serde(default = "default_ollama_url")]
    pub url: Url,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Vector size of the hashing embedder
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            url: default_ollama_url(),
            model: default_embedding_model(),
            dimensions: default_embedding_dimensions(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Grammar checking backend used by the coherence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrammarBackend {
    #[default]
    RuleBased,
    LanguageTool,
}

/// Quality scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// A pair is kept only when its quality is strictly above this value
    #[serde(default = "default_min_quality")]
    pub min_quality: f64,
    /// Grammar errors that drive the grammar component to zero
    #[serde(default = "default_grammar_error_scale")]
    pub grammar_error_scale: f64,
    #[serde(default)]
    pub grammar: GrammarBackend,
    #[serde(default = "default_language_tool_url")]
    pub language_tool_url: Url,
    #[serde(default = "default_grammar_language")]
    pub language: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_quality: default_min_quality(),
            grammar_error_scale: default_grammar_error_scale(),
            grammar: GrammarBackend::default(),
            language_tool_url: default_language_tool_url(),
            language: default_grammar_language(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Answer validation and deduplication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Shortest acceptable trimmed answer in characters
    #[serde(default = "default_min_answer_chars")]
    pub min_answer_chars: usize,
    /// Degenerate answers, compared case-insensitively
    #[serde(default = "default_answer_blacklist")]
    pub blacklist: Vec<String>,
    /// Question similarity at or above which a pair is a duplicate
    #[serde(default = "default_duplicate_threshold")]
    pub duplicate_threshold: f32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_answer_chars: default_min_answer_chars(),
            blacklist: default_answer_blacklist(),
            duplicate_threshold: default_duplicate_threshold(),
        }
    }
}

/// Translation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslatorBackend {
    /// Local language detection, text passes through untranslated
    #[default]
    Identity,
    /// HTTP translation service
    Service,
}

/// Language detection and translation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Run the Spanish round trip at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub backend: TranslatorBackend,
    #[serde(default = "default_translation_url")]
    pub url: Url,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: TranslatorBackend::default(),
            url: default_translation_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter, e.g. `info` or `qagen_core=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format (json, pretty, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Log file path (optional)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Maximum request body in bytes
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            max_request_size: default_max_request_size(),
        }
    }
}

impl QagenConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        // Try YAML first, then JSON
        match serde_yaml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(_) => {
                let config = serde_json::from_str(&content)?;
                Ok(config)
            }
        }
    }

    /// Load defaults, then an optional file, then `QAGEN_*` environment overrides
    ///
    /// Nested keys use a double underscore, so `QAGEN_GENERATION__MAX_CONCURRENCY=8`
    /// sets `generation.max_concurrency`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.name.trim().is_empty() {
            return Err(QagenError::validation("Model name cannot be empty"));
        }

        let profile = self.model.profile();
        if profile.max_tokens <= profile.recommended_output_tokens {
            return Err(QagenError::validation(format!(
                "Token budget must be positive: max_tokens {} <= output tokens {}",
                profile.max_tokens, profile.recommended_output_tokens
            )));
        }

        if self.generation.max_concurrency == 0 {
            return Err(QagenError::validation(
                "generation.max_concurrency must be at least 1",
            ));
        }
        if self.generation.timeout_seconds == 0 {
            return Err(QagenError::validation(
                "generation.timeout_seconds must be at least 1",
            ));
        }

        if !(0.0..=1.0).contains(&self.quality.min_quality) {
            return Err(QagenError::validation(
                "quality.min_quality must be within [0, 1]",
            ));
        }
        if self.quality.grammar_error_scale <= 0.0 {
            return Err(QagenError::validation(
                "quality.grammar_error_scale must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.validation.duplicate_threshold) {
            return Err(QagenError::validation(
                "validation.duplicate_threshold must be within [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.chunking.char_overlap_ratio) {
            return Err(QagenError::validation(
                "chunking.char_overlap_ratio must be within [0, 1]",
            ));
        }
        if self.chunking.tokenizer == TokenizerKind::Pretrained && self.chunking.tokenizer_file.is_none() {
            return Err(QagenError::validation(
                "chunking.tokenizer_file is required for the pretrained tokenizer",
            ));
        }
        if self.embeddings.dimensions == 0 {
            return Err(QagenError::validation(
                "embeddings.dimensions must be at least 1",
            ));
        }

        for (name, url) in [
            ("model.url", &self.model.url),
            ("embeddings.url", &self.embeddings.url),
            ("quality.language_tool_url", &self.quality.language_tool_url),
            ("translation.url", &self.translation.url),
        ] {
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(QagenError::validation(format!(
                    "{} must use http or https scheme",
                    name
                )));
            }
        }

        Ok(())
    }
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_version() -> String {
    "1.0".to_string()
}
fn default_model_name() -> String {
    "google/flan-t5-large".to_string()
}
fn default_model_url() -> Url {
    Url::parse("http://localhost:8080").expect("default model URL is valid")
}
fn default_ollama_url() -> Url {
    Url::parse("http://localhost:11434").expect("default Ollama URL is valid")
}
fn default_language_tool_url() -> Url {
    Url::parse("http://localhost:8010").expect("default LanguageTool URL is valid")
}
fn default_translation_url() -> Url {
    Url::parse("http://localhost:5000").expect("default translation URL is valid")
}
fn default_timeout() -> u64 {
    30
}
fn default_overlap_sentences() -> usize {
    6
}
fn default_overlap_tokens() -> usize {
    50
}
fn default_min_sentence_chunk_tokens() -> usize {
    100
}

fn default_min_chunk_margin() -> usize {
    100
}
fn default_char_overlap_ratio() -> f64 {
    crate::chunking::DEFAULT_OVERLAP_RATIO
}
fn default_max_concurrency() -> usize {
    5
}
fn default_embedding_model() -> String {
    "all-minilm".to_string()
}
fn default_embedding_dimensions() -> usize {
    384
}
fn default_min_quality() -> f64 {
    0.3
}
fn default_grammar_error_scale() -> f64 {
    5.0
}
fn default_grammar_language() -> String {
    "en-US".to_string()
}
fn default_min_answer_chars() -> usize {
    15
}
fn default_answer_blacklist() -> Vec<String> {
    ["none", "n/a", "(ii)", "..."]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_duplicate_threshold() -> f32 {
    0.85
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_max_request_size() -> usize {
    10 * 1024 * 1024
}
