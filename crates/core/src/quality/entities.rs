//! Named-entity extraction for the relevance score

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{N}+(?:[.,]\p{N}+)*|[\p{L}\p{N}][\p{L}\p{N}'\-]*").expect("token pattern is valid"));

/// Words that open a capitalised run without being part of the entity
const FUNCTION_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "but", "by", "for", "from", "he", "her", "his", "how",
    "i", "if", "in", "is", "it", "its", "my", "of", "on", "or", "our", "she", "that", "the",
    "their", "these", "they", "this", "those", "to", "was", "we", "were", "what", "when",
    "where", "which", "who", "why", "with", "you", "your",
];

/// Entity extraction capability
///
/// Returns lowercase surface forms so comparisons are case-insensitive.
pub trait EntityExtractor: Send + Sync {
    fn extract_entities(&self, text: &str) -> HashSet<String>;
}

/// Capitalisation-based entity spotter
///
/// Picks up runs of capitalised words ("WorkForce Pro"), camel-case and
/// all-caps words ("EcoTank", "USB") and numbers ("2024", "4.5"). A lone
/// capitalised word that opens a sentence only counts when it is
/// distinctive or also appears capitalised mid-sentence elsewhere.
///
/// # Examples
///
/// ```
/// use qagen_core::quality::{EntityExtractor, HeuristicEntityExtractor};
///
/// let entities = HeuristicEntityExtractor.extract_entities(
///     "The EcoTank system was launched by Epson in 2010.",
/// );
/// assert!(entities.contains("ecotank"));
/// assert!(entities.contains("epson"));
/// assert!(entities.contains("2010"));
/// assert!(!entities.contains("the"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEntityExtractor;

struct Token<'a> {
    text: &'a str,
    sentence_start: bool,
    adjacent: bool,
}

fn tokens(text: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut previous_end = None;
    for m in TOKEN.find_iter(text) {
        let (sentence_start, adjacent) = match previous_end {
            None => (true, false),
            Some(end) => {
                let gap = &text[end..m.start()];
                (
                    gap.contains(|c: char| matches!(c, '.' | '!' | '?')),
                    gap.chars().all(char::is_whitespace),
                )
            }
        };
        out.push(Token {
            text: m.as_str(),
            sentence_start,
            adjacent,
        });
        previous_end = Some(m.end());
    }
    out
}

fn is_capitalised(word: &str) -> bool {
    word.chars().next().map(char::is_uppercase).unwrap_or(false)
}

fn is_numeric(word: &str) -> bool {
    word.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false)
}

fn is_distinctive(word: &str) -> bool {
    word.chars().skip(1).any(char::is_uppercase) || word.chars().any(|c| c.is_ascii_digit())
}

fn is_function_word(word: &str) -> bool {
    FUNCTION_WORDS.contains(&word.to_lowercase().as_str())
}

impl HeuristicEntityExtractor {
    fn flush(
        run: &mut Vec<&str>,
        run_opens_sentence: bool,
        seen_mid_sentence: &HashSet<String>,
        entities: &mut HashSet<String>,
    ) {
        let skip = run.iter().take_while(|w| is_function_word(w)).count();
        let words = &run[skip..];

        if let [single] = words {
            let opens_sentence = run_opens_sentence && skip == 0;
            if opens_sentence
                && !is_distinctive(single)
                && !seen_mid_sentence.contains(&single.to_lowercase())
            {
                run.clear();
                return;
            }
        }

        if !words.is_empty() {
            entities.insert(words.join(" ").to_lowercase());
        }
        run.clear();
    }
}

impl EntityExtractor for HeuristicEntityExtractor {
    fn extract_entities(&self, text: &str) -> HashSet<String> {
        let tokens = tokens(text);

        let seen_mid_sentence: HashSet<String> = tokens
            .iter()
            .filter(|t| !t.sentence_start && is_capitalised(t.text))
            .map(|t| t.text.to_lowercase())
            .collect();

        let mut entities = HashSet::new();
        let mut run: Vec<&str> = Vec::new();
        let mut run_opens_sentence = false;

        for token in &tokens {
            if !token.adjacent || token.sentence_start {
                Self::flush(&mut run, run_opens_sentence, &seen_mid_sentence, &mut entities);
            }

            if is_numeric(token.text) {
                Self::flush(&mut run, run_opens_sentence, &seen_mid_sentence, &mut entities);
                entities.insert(token.text.to_lowercase());
            } else if is_capitalised(token.text) {
                if run.is_empty() {
                    run_opens_sentence = token.sentence_start;
                }
                run.push(token.text);
            } else {
                Self::flush(&mut run, run_opens_sentence, &seen_mid_sentence, &mut entities);
            }
        }
        Self::flush(&mut run, run_opens_sentence, &seen_mid_sentence, &mut entities);

        entities
    }
}
