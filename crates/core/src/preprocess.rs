//! Text normalization applied before a context reaches the model
//!
//! The steps run in a fixed order:
//!
//! 1. Unicode compatibility composition (NFKC)
//! 2. Anything outside printable ASCII plus accented Latin becomes a space
//! 3. Typographic quotes become straight quotes, then all quotes are dropped
//! 4. Newlines and tabs become spaces
//! 5. Bracket characters `{ } [ ] < >` are removed
//! 6. Whitespace runs collapse to one space
//! 7. Leading and trailing whitespace is trimmed
//!
//! An empty result means the input is unusable and the chunk must be skipped.
//!
//! # Examples
//!
//! ```
//! use qagen_core::preprocess::normalize;
//!
//! assert_eq!(normalize("  \"Hello\"\n\t[world]  "), "Hello world");
//! assert_eq!(normalize("\u{1F600}\u{1F600}"), "");
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Accented letters kept on top of printable ASCII
const ACCENTED_LATIN: &[char] = &['á', 'é', 'í', 'ó', 'ú', 'Á', 'É', 'Í', 'Ó', 'Ú', 'ñ', 'Ñ', 'ü', 'Ü'];

fn is_allowed(c: char) -> bool {
    matches!(c, '\x20'..='\x7E') || ACCENTED_LATIN.contains(&c)
}

/// Normalize raw text for generation and scoring. Never fails.
pub fn normalize(text: &str) -> String {
    let composed: String = text.nfkc().collect();

    let allowed: String = composed
        .chars()
        .map(|c| if is_allowed(c) { c } else { ' ' })
        .collect();

    let unquoted: String = allowed
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .filter(|c| *c != '"' && *c != '\'')
        .collect();

    let flattened: String = unquoted
        .chars()
        .map(|c| if c == '\n' || c == '\t' { ' ' } else { c })
        .filter(|c| !matches!(c, '{' | '}' | '[' | ']' | '<' | '>'))
        .collect();

    WHITESPACE_RUN
        .replace_all(&flattened, " ")
        .trim()
        .to_string()
}

/// Stateless preprocessor handle so callers can hold it alongside other stages
#[derive(Debug, Clone, Copy, Default)]
pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Normalize text, see [`normalize`]
    pub fn clean(&self, text: &str) -> String {
        normalize(text)
    }

    /// Normalize text and return `None` when nothing usable remains
    pub fn clean_non_empty(&self, text: &str) -> Option<String> {
        let cleaned = normalize(text);
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_is_unchanged() {
        let text = "The EcoTank system drastically reduces printing costs.";
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn test_collapses_whitespace_and_trims() {
        assert_eq!(normalize("  hello   world \n\n again\t "), "hello world again");
    }

    #[test]
    fn test_removes_quotes() {
        assert_eq!(normalize("He said \"yes\" and 'no'"), "He said yes and no");
    }

    #[test]
    fn test_typographic_quotes_become_spaces() {
        // Curly quotes fall outside the allowlist before quote folding runs.
        assert_eq!(normalize("\u{201C}quoted\u{201D} don\u{2019}t"), "quoted don t");
    }

    #[test]
    fn test_removes_brackets() {
        assert_eq!(normalize("{a} [b] <c>"), "a b c");
    }

    #[test]
    fn test_keeps_accented_latin() {
        assert_eq!(normalize("Canción para niños"), "Canción para niños");
    }

    #[test]
    fn test_replaces_control_and_symbols() {
        assert_eq!(normalize("price\u{0001}€10"), "price 10");
    }

    #[test]
    fn test_nfkc_folds_compatibility_characters() {
        // U+FB01 LATIN SMALL LIGATURE FI decomposes to "fi"
        assert_eq!(normalize("\u{FB01}nal"), "final");
        // Non-breaking space becomes a regular space
        assert_eq!(normalize("a\u{00A0}b"), "a b");
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("\"\" [] {}"), "");
        assert!(Preprocessor::new().clean_non_empty("  <> ").is_none());
        assert_eq!(
            Preprocessor::new().clean_non_empty(" ok ").as_deref(),
            Some("ok")
        );
    }
}
