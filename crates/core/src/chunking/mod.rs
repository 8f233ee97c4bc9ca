//! Splitting long text into model-sized chunks
//!
//! Three strategies are available:
//!
//! - [`chunk_by_sentences`] - greedy sentence packing under a token budget,
//!   with sentence overlap and a back-merged short tail (the default)
//! - [`chunk_by_tokens`] - fixed token windows with token overlap
//! - [`chunk_and_overlap`] - fixed character windows, no tokenizer needed
//!
//! [`Chunker`] bundles a tokenizer with the configured strategy so callers
//! only hand it text.

pub mod chars;
pub mod sentences;
pub mod tokens;

pub use chars::{chunk_and_overlap, overlap_for, DEFAULT_OVERLAP_RATIO};
pub use sentences::{chunk_by_sentences, split_into_sentences, SentenceChunkOptions};
pub use tokens::{chunk_by_tokens, TokenChunkOptions};

use crate::config::{ChunkingConfig, ModelProfile};
use crate::error::Result;
use crate::tokenizer::{Tokenizer, TokenizerKind, WhitespaceTokenizer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Model input limits used to size chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBudget {
    pub max_input_tokens: usize,
    pub max_output_tokens: usize,
}

impl TokenBudget {
    pub fn new(max_input_tokens: usize, max_output_tokens: usize) -> Self {
        Self {
            max_input_tokens,
            max_output_tokens,
        }
    }

    /// Tokens available to one chunk, never less than one
    ///
    /// ```
    /// use qagen_core::chunking::TokenBudget;
    ///
    /// assert_eq!(TokenBudget::new(512, 100).chunk_tokens(), 412);
    /// assert_eq!(TokenBudget::new(10, 50).chunk_tokens(), 1);
    /// ```
    pub fn chunk_tokens(&self) -> usize {
        self.max_input_tokens
            .saturating_sub(self.max_output_tokens)
            .max(1)
    }
}

impl From<&ModelProfile> for TokenBudget {
    fn from(profile: &ModelProfile) -> Self {
        Self::new(profile.max_tokens, profile.recommended_output_tokens)
    }
}

/// Chunking strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    #[default]
    Sentences,
    Tokens,
    Characters,
}

impl std::fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sentences => write!(f, "sentences"),
            Self::Tokens => write!(f, "tokens"),
            Self::Characters => write!(f, "characters"),
        }
    }
}

impl std::str::FromStr for ChunkStrategy {
    type Err = crate::QagenError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sentences" => Ok(Self::Sentences),
            "tokens" => Ok(Self::Tokens),
            "characters" | "chars" => Ok(Self::Characters),
            other => Err(crate::QagenError::validation(format!(
                "Unknown chunk strategy '{}'",
                other
            ))),
        }
    }
}

/// Resolved chunking parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkerSettings {
    pub strategy: ChunkStrategy,
    pub budget: TokenBudget,
    pub sentences: SentenceChunkOptions,
    pub tokens: TokenChunkOptions,
    pub char_chunk_size: usize,
    pub char_overlap: usize,
}

impl ChunkerSettings {
    /// Resolve configuration against the active model profile
    ///
    /// The token-window minimum defaults to the profile's input limit minus
    /// `min_chunk_margin`; the sentence minimum is its own setting. The
    /// character window defaults to the profile's input limit.
    pub fn resolve(config: &ChunkingConfig, profile: &ModelProfile) -> Self {
        let min_window_tokens = config
            .min_chunk_tokens
            .unwrap_or_else(|| profile.max_tokens.saturating_sub(config.min_chunk_margin));
        let char_chunk_size = config.char_chunk_size.unwrap_or(profile.max_tokens);

        Self {
            strategy: config.strategy,
            budget: TokenBudget::from(profile),
            sentences: SentenceChunkOptions {
                overlap_sentences: config.overlap_sentences,
                min_chunk_tokens: config.min_sentence_chunk_tokens,
            },
            tokens: TokenChunkOptions {
                overlap_tokens: config.overlap_tokens,
                min_chunk_tokens: min_window_tokens,
            },
            char_chunk_size,
            char_overlap: overlap_for(char_chunk_size, config.char_overlap_ratio),
        }
    }
}

/// Where a [`Chunker`] gets its tokenizer
#[derive(Clone)]
enum TokenizerSource {
    Shared(Arc<dyn Tokenizer>),
    /// A fresh [`WhitespaceTokenizer`] per call, so no word vocabulary
    /// outlives the text it was built from
    ScopedWords,
}

/// Tokenizer plus settings, ready to chunk text
#[derive(Clone)]
pub struct Chunker {
    tokenizer: TokenizerSource,
    settings: ChunkerSettings,
}

impl std::fmt::Debug for Chunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunker")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Chunker {
    /// Chunker sharing one tokenizer across calls
    pub fn new(tokenizer: Arc<dyn Tokenizer>, settings: ChunkerSettings) -> Self {
        Self {
            tokenizer: TokenizerSource::Shared(tokenizer),
            settings,
        }
    }

    /// Build a chunker from configuration, constructing the configured tokenizer
    pub fn from_config(config: &ChunkingConfig, profile: &ModelProfile) -> Result<Self> {
        let settings = ChunkerSettings::resolve(config, profile);
        let tokenizer = match config.tokenizer {
            TokenizerKind::Whitespace => TokenizerSource::ScopedWords,
            kind => TokenizerSource::Shared(kind.build(config.tokenizer_file.as_deref())?),
        };
        if config.tokenizer != TokenizerKind::Pretrained {
            warn!(
                tokenizer = %config.tokenizer,
                "Token budgets use a local tokenizer; set chunking.tokenizer to pretrained for model-exact counts"
            );
        }
        Ok(Self { tokenizer, settings })
    }

    pub fn settings(&self) -> &ChunkerSettings {
        &self.settings
    }

    fn with_tokenizer<T>(&self, f: impl FnOnce(&dyn Tokenizer) -> T) -> T {
        match &self.tokenizer {
            TokenizerSource::Shared(tokenizer) => f(tokenizer.as_ref()),
            TokenizerSource::ScopedWords => f(&WhitespaceTokenizer::new()),
        }
    }

    /// Chunk text with the configured strategy
    pub fn chunk(&self, text: &str) -> Result<Vec<String>> {
        self.chunk_with(text, self.settings.strategy)
    }

    /// Chunk text with an explicit strategy
    pub fn chunk_with(&self, text: &str, strategy: ChunkStrategy) -> Result<Vec<String>> {
        let chunks = match strategy {
            ChunkStrategy::Sentences => self.with_tokenizer(|tokenizer| {
                chunk_by_sentences(text, tokenizer, self.settings.budget, self.settings.sentences)
            })?,
            ChunkStrategy::Tokens => self.with_tokenizer(|tokenizer| {
                chunk_by_tokens(text, tokenizer, self.settings.budget, self.settings.tokens)
            })?,
            ChunkStrategy::Characters => chunk_and_overlap(
                text,
                self.settings.char_chunk_size,
                self.settings.char_overlap,
            ),
        };

        info!(
            strategy = %strategy,
            chunks = chunks.len(),
            input_chars = text.len(),
            "Chunked text"
        );
        Ok(chunks)
    }

    /// Token count of `text` under this chunker's tokenizer
    pub fn count_tokens(&self, text: &str) -> Result<usize> {
        self.with_tokenizer(|tokenizer| tokenizer.count_tokens(text))
    }
}
