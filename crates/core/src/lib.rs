//! qagen core library
//!
//! Turns raw documents into curated question/answer pairs: text is
//! normalized, split into token-bounded chunks, sent to a text-to-text model
//! for a question and an answer, scored for quality, then validated,
//! deduplicated and ranked.
//!
//! The model, tokenizer, embedding, grammar and translation capabilities are
//! traits with HTTP and offline implementations, wired together by
//! [`pipeline::PipelineBuilder`].

pub mod ai;
pub mod chunking;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod preprocess;
pub mod quality;
pub mod semantic;
pub mod tokenizer;
pub mod translate;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use ai::{DecodingParams, GenerationOutcome, QaGenerator, TextGenerator};
pub use chunking::{ChunkStrategy, Chunker, TokenBudget};
pub use config::{LoggingConfig, ModelProfile, QagenConfig};
pub use error::{ErrorCategory, QagenError, Result};
pub use pipeline::{PipelineBuilder, PipelineSettings, QaPipeline};
pub use preprocess::{normalize, Preprocessor};
pub use quality::{QualityEvaluator, QualityScores};
pub use semantic::{Embedder, HashingEmbedder};
pub use tokenizer::{PretrainedTokenizer, Tokenizer, TokenizerKind};
pub use translate::{Language, Translator};
pub use types::{ContextInput, GeneratedQa, ProcessCode};
pub use validation::{AnswerValidator, QaCurator};

/// Initialize logging with JSON formatting
pub fn init_logging() -> Result<()> {
    init_logging_with_config("qagen_core=info", "json")
}

/// Initialize logging with custom configuration
///
/// `level` is an `EnvFilter` directive string; `format` is one of `json`,
/// `pretty` (or `text`) and `compact`.
pub fn init_logging_with_config(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::new(level);
    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format {
        "json" => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        "text" | "pretty" => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init(),
        "compact" => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
        _ => {
            return Err(QagenError::validation(format!(
                "Unknown log format: {}",
                format
            )));
        }
    };

    result.map_err(|e| QagenError::invalid_state(format!("logging already initialized: {}", e)))
}

/// Initialize logging from the `logging` configuration section
///
/// When a log file is configured, JSON lines are appended to it instead of
/// being written to stdout.
pub fn init_logging_from_config(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let Some(path) = &config.file else {
        return init_logging_with_config(&config.level, &config.format);
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| QagenError::invalid_state(format!("logging already initialized: {}", e)))
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version info as a formatted string
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
