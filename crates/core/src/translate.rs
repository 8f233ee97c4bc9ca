//! Language detection and translation for the Spanish round trip
//!
//! Only English and Spanish are supported. [`translate_or_passthrough`]
//! wraps a [`Translator`] the way the pipeline uses it: same-language or
//! blank input is returned untouched, and a failing translation is logged
//! and falls back to the input text.

use crate::ai::transport_error;
use crate::error::{QagenError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

const SERVICE: &str = "translator";

/// Minimum stopword hits before a detection is trusted
const DETECTION_THRESHOLD: usize = 3;

const ENGLISH_STOPWORDS: &[&str] = &[
    "the", "and", "is", "are", "was", "were", "of", "to", "in", "that", "it", "for", "on", "with",
    "as", "this", "by", "be", "at", "from", "or", "an", "which", "have", "has", "not", "but",
];

const SPANISH_STOPWORDS: &[&str] = &[
    "el", "la", "los", "las", "de", "del", "que", "y", "en", "un", "una", "es", "por", "con",
    "para", "su", "sus", "al", "lo", "como", "más", "pero", "se", "este", "esta", "son", "muy",
];

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Spanish => "es",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = QagenError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" => Ok(Self::English),
            "es" => Ok(Self::Spanish),
            other => Err(QagenError::precondition(format!(
                "unsupported language '{}', expected 'en' or 'es'",
                other
            ))),
        }
    }
}

/// Detect a language from stopword counts
///
/// Anything that is not confidently Spanish is treated as English.
///
/// ```
/// use qagen_core::translate::{detect_by_stopwords, Language};
///
/// let text = "El sistema de tinta reduce los costos de la impresión";
/// assert_eq!(detect_by_stopwords(text), Language::Spanish);
/// assert_eq!(detect_by_stopwords("Printing costs"), Language::English);
/// ```
pub fn detect_by_stopwords(text: &str) -> Language {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    let spanish = words.iter().filter(|w| SPANISH_STOPWORDS.contains(w)).count();
    let english = words.iter().filter(|w| ENGLISH_STOPWORDS.contains(w)).count();

    if spanish >= DETECTION_THRESHOLD && spanish > english {
        Language::Spanish
    } else {
        Language::English
    }
}

/// Translation capability
#[async_trait]
pub trait Translator: Send + Sync {
    fn name(&self) -> &str;

    async fn detect_language(&self, text: &str) -> Result<Language>;

    async fn translate(&self, text: &str, from: Language, to: Language) -> Result<String>;
}

/// Translate, returning the input unchanged when there is nothing to do or
/// the translator fails
pub async fn translate_or_passthrough(
    translator: &dyn Translator,
    text: &str,
    from: Language,
    to: Language,
) -> String {
    if from == to || text.trim().is_empty() {
        return text.to_string();
    }
    match translator.translate(text, from, to).await {
        Ok(translated) => translated,
        Err(e) => {
            warn!(from = %from, to = %to, error = %e, "Translation failed, keeping original text");
            text.to_string()
        }
    }
}

/// Detects language locally and never changes text
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

#[async_trait]
impl Translator for IdentityTranslator {
    fn name(&self) -> &str {
        "identity"
    }

    async fn detect_language(&self, text: &str) -> Result<Language> {
        Ok(detect_by_stopwords(text))
    }

    async fn translate(&self, text: &str, _from: Language, _to: Language) -> Result<String> {
        Ok(text.to_string())
    }
}

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    language: String,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source: Language,
    target: Language,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translation: String,
}

/// Client for an HTTP translation service exposing `/detect` and `/translate`
#[derive(Debug, Clone)]
pub struct TranslationServiceClient {
    client: Client,
    base_url: String,
}

impl TranslationServiceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = ClientBuilder::new().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post<Req: Serialize + Sync, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Resp> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QagenError::unavailable(
                SERVICE,
                format!("HTTP {} from {}", status, path),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| QagenError::unexpected_output(e.to_string()))
    }
}

#[async_trait]
impl Translator for TranslationServiceClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn detect_language(&self, text: &str) -> Result<Language> {
        let response: DetectResponse = self.post("/detect", &DetectRequest { text }).await?;
        debug!(language = %response.language, "Detected language");
        // Languages other than the two supported ones are handled as English
        Ok(response.language.parse().unwrap_or(Language::English))
    }

    async fn translate(&self, text: &str, from: Language, to: Language) -> Result<String> {
        let request = TranslateRequest {
            text,
            source: from,
            target: to,
        };
        let response: TranslateResponse = self.post("/translate", &request).await?;
        Ok(response.translation)
    }
}
