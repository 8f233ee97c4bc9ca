//! Tokenizer capability used for token counting and window boundaries
//!
//! The chunker only needs to count tokens and turn token windows back into
//! text, so the trait stays narrow. Implementations:
//!
//! - [`PretrainedTokenizer`] - the model's own `tokenizer.json`, loaded with
//!   the `tokenizers` crate; counts match what the model sees
//! - [`ByteTokenizer`] - one token per UTF-8 byte, lossless and exact
//! - [`WhitespaceTokenizer`] - one token per whitespace-separated word, with
//!   an end-of-sequence token when special tokens are requested
//!
//! The two local tokenizers need no files and keep tests offline.

use crate::error::{QagenError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Token id type
pub type TokenId = u32;

/// Text tokenizer
pub trait Tokenizer: Send + Sync {
    /// Encode text into token ids
    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Vec<TokenId>>;

    /// Decode token ids back into text
    fn decode(&self, tokens: &[TokenId]) -> Result<String>;

    /// Number of tokens in `text`, special tokens excluded
    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(self.encode(text, false)?.len())
    }
}

/// Tokenizer selection for configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    Bytes,
    #[default]
    Whitespace,
    /// A Hugging Face `tokenizer.json`, see `chunking.tokenizer_file`
    Pretrained,
}

impl std::fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes => write!(f, "bytes"),
            Self::Whitespace => write!(f, "whitespace"),
            Self::Pretrained => write!(f, "pretrained"),
        }
    }
}

impl TokenizerKind {
    /// Build the tokenizer behind this kind
    ///
    /// `file` is required for [`TokenizerKind::Pretrained`] and ignored
    /// otherwise.
    pub fn build(self, file: Option<&Path>) -> Result<Arc<dyn Tokenizer>> {
        match self {
            Self::Bytes => Ok(Arc::new(ByteTokenizer)),
            Self::Whitespace => Ok(Arc::new(WhitespaceTokenizer::new())),
            Self::Pretrained => {
                let path = file.ok_or_else(|| {
                    QagenError::validation(
                        "chunking.tokenizer_file is required for the pretrained tokenizer",
                    )
                })?;
                Ok(Arc::new(PretrainedTokenizer::from_file(path)?))
            }
        }
    }
}

/// A model tokenizer loaded from a Hugging Face `tokenizer.json`
///
/// For flan-t5 this is the SentencePiece vocabulary the model was trained
/// with, so token budgets computed here hold for the real model input.
pub struct PretrainedTokenizer {
    inner: tokenizers::Tokenizer,
    path: PathBuf,
}

impl std::fmt::Debug for PretrainedTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PretrainedTokenizer")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl PretrainedTokenizer {
    /// Load a serialized tokenizer
    pub fn from_file(path: &Path) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            QagenError::chunking(format!(
                "Cannot load tokenizer from '{}': {}",
                path.display(),
                e
            ))
        })?;
        tracing::info!(
            path = %path.display(),
            vocab = inner.get_vocab_size(true),
            "Loaded pretrained tokenizer"
        );
        Ok(Self {
            inner,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Tokenizer for PretrainedTokenizer {
    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Vec<TokenId>> {
        let encoding = self
            .inner
            .encode(text, add_special_tokens)
            .map_err(|e| QagenError::chunking(format!("Tokenization failed: {}", e)))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, tokens: &[TokenId]) -> Result<String> {
        self.inner
            .decode(tokens, true)
            .map_err(|e| QagenError::chunking(format!("Detokenization failed: {}", e)))
    }
}

/// One token per UTF-8 byte
///
/// # Examples
///
/// ```
/// use qagen_core::tokenizer::{ByteTokenizer, Tokenizer};
///
/// let tokenizer = ByteTokenizer;
/// let ids = tokenizer.encode("héllo", true).unwrap();
/// assert_eq!(ids.len(), 6);
/// assert_eq!(tokenizer.decode(&ids).unwrap(), "héllo");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteTokenizer;

impl Tokenizer for ByteTokenizer {
    fn encode(&self, text: &str, _add_special_tokens: bool) -> Result<Vec<TokenId>> {
        Ok(text.bytes().map(TokenId::from).collect())
    }

    fn decode(&self, tokens: &[TokenId]) -> Result<String> {
        let bytes: Vec<u8> = tokens
            .iter()
            .filter_map(|t| u8::try_from(*t).ok())
            .collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(text.len())
    }
}

/// Reserved id appended as end-of-sequence marker
pub const EOS_TOKEN_ID: TokenId = 1;

/// First id handed out to vocabulary words
const FIRST_WORD_ID: TokenId = 2;

/// Word-level tokenizer with an interned vocabulary
///
/// Words get ids in first-seen order and the vocabulary lives as long as
/// the instance, so long-lived callers should create one per request.
/// Counting does not touch the vocabulary.
///
/// # Examples
///
/// ```
/// use qagen_core::tokenizer::{Tokenizer, WhitespaceTokenizer, EOS_TOKEN_ID};
///
/// let tokenizer = WhitespaceTokenizer::new();
/// let ids = tokenizer.encode("to be or not to be", true).unwrap();
/// assert_eq!(ids.len(), 7);
/// assert_eq!(ids[0], ids[4]);
/// assert_eq!(*ids.last().unwrap(), EOS_TOKEN_ID);
/// assert_eq!(tokenizer.decode(&ids).unwrap(), "to be or not to be");
/// ```
#[derive(Debug, Default)]
pub struct WhitespaceTokenizer {
    vocab: RwLock<Vocabulary>,
}

#[derive(Debug, Default)]
struct Vocabulary {
    ids: HashMap<String, TokenId>,
    words: Vec<String>,
}

impl WhitespaceTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct words seen so far
    pub fn vocab_size(&self) -> usize {
        self.vocab.read().words.len()
    }

    fn intern(&self, word: &str) -> TokenId {
        if let Some(id) = self.vocab.read().ids.get(word) {
            return *id;
        }

        let mut vocab = self.vocab.write();
        if let Some(id) = vocab.ids.get(word) {
            return *id;
        }
        let id = FIRST_WORD_ID + vocab.words.len() as TokenId;
        vocab.ids.insert(word.to_string(), id);
        vocab.words.push(word.to_string());
        id
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn encode(&self, text: &str, add_special_tokens: bool) -> Result<Vec<TokenId>> {
        let mut ids: Vec<TokenId> = text.split_whitespace().map(|w| self.intern(w)).collect();
        if add_special_tokens {
            ids.push(EOS_TOKEN_ID);
        }
        Ok(ids)
    }

    fn decode(&self, tokens: &[TokenId]) -> Result<String> {
        let vocab = self.vocab.read();
        Ok(tokens
            .iter()
            .filter(|id| **id >= FIRST_WORD_ID)
            .filter_map(|id| vocab.words.get((*id - FIRST_WORD_ID) as usize))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(text.split_whitespace().count())
    }
}
