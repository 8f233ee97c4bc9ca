//! Grammar checking for the coherence score

use crate::ai::transport_error;
use crate::error::{QagenError, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const SERVICE: &str = "languagetool";

/// Grammar checking capability
#[async_trait]
pub trait GrammarChecker: Send + Sync {
    fn name(&self) -> &str;

    /// Number of issues flagged in `text`
    async fn check_errors(&self, text: &str) -> Result<usize>;
}

struct Rule {
    name: &'static str,
    pattern: Lazy<Regex>,
}

static RULES: [Rule; 5] = [
    Rule {
        name: "doubled_space",
        pattern: Lazy::new(|| Regex::new(r" {2,}").expect("rule pattern is valid")),
    },
    Rule {
        name: "space_before_punctuation",
        pattern: Lazy::new(|| Regex::new(r" [,.;:!?]").expect("rule pattern is valid")),
    },
    Rule {
        name: "repeated_punctuation",
        pattern: Lazy::new(|| Regex::new(r"[,;:!?]{2,}").expect("rule pattern is valid")),
    },
    Rule {
        name: "lowercase_sentence_start",
        pattern: Lazy::new(|| Regex::new(r"(?:^|[.!?]\s+)\p{Ll}").expect("rule pattern is valid")),
    },
    Rule {
        name: "lowercase_pronoun",
        pattern: Lazy::new(|| Regex::new(r"\bi\b").expect("rule pattern is valid")),
    },
];

/// Offline checker built from a handful of surface rules
///
/// Flags doubled spaces, a space before punctuation, repeated punctuation,
/// lowercase sentence starts, a lowercase pronoun "i" and unbalanced
/// parentheses.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedGrammarChecker;

impl RuleBasedGrammarChecker {
    /// Count issues synchronously
    pub fn count_errors(&self, text: &str) -> usize {
        let mut errors = 0;
        for rule in &RULES {
            let hits = rule.pattern.find_iter(text).count();
            if hits > 0 {
                debug!(rule = rule.name, hits, "Grammar rule matched");
            }
            errors += hits;
        }
        errors + unbalanced_parentheses(text)
    }
}

fn unbalanced_parentheses(text: &str) -> usize {
    let mut depth = 0usize;
    let mut unmatched_close = 0usize;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' if depth > 0 => depth -= 1,
            ')' => unmatched_close += 1,
            _ => {}
        }
    }
    depth + unmatched_close
}

#[async_trait]
impl GrammarChecker for RuleBasedGrammarChecker {
    fn name(&self) -> &str {
        "rule_based"
    }

    async fn check_errors(&self, text: &str) -> Result<usize> {
        Ok(self.count_errors(text))
    }
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    #[serde(default)]
    matches: Vec<serde_json::Value>,
}

/// Client for a LanguageTool server
#[derive(Debug, Clone)]
pub struct LanguageToolClient {
    client: Client,
    base_url: String,
    language: String,
}

impl LanguageToolClient {
    pub fn new(
        base_url: impl Into<String>,
        language: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = ClientBuilder::new().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            language: language.into(),
        })
    }
}

#[async_trait]
impl GrammarChecker for LanguageToolClient {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn check_errors(&self, text: &str) -> Result<usize> {
        let url = format!("{}/v2/check", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(&[("text", text), ("language", self.language.as_str())])
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "LanguageTool check failed");
            return Err(QagenError::unavailable(SERVICE, format!("HTTP {}", status)));
        }

        let body: CheckResponse = response
            .json()
            .await
            .map_err(|e| QagenError::unexpected_output(e.to_string()))?;
        Ok(body.matches.len())
    }
}
