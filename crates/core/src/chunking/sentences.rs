//! Sentence-aware chunking under a token budget

use super::TokenBudget;
use crate::error::Result;
use crate::tokenizer::Tokenizer;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Terminal punctuation followed by whitespace
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("sentence boundary pattern is valid"));

/// Split text on terminal punctuation followed by whitespace
///
/// The punctuation stays with the sentence it ends; the whitespace is
/// dropped. Blank input yields no sentences.
///
/// # Examples
///
/// ```
/// use qagen_core::chunking::split_into_sentences;
///
/// let sentences = split_into_sentences("One. Two! Three? Four");
/// assert_eq!(sentences, vec!["One.", "Two!", "Three?", "Four"]);
/// ```
pub fn split_into_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        // Punctuation is ASCII, so one byte past the match start is a char boundary
        sentences.push(&text[start..boundary.start() + 1]);
        start = boundary.end();
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

/// Options for [`chunk_by_sentences`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceChunkOptions {
    /// Sentences repeated at the start of the next chunk
    pub overlap_sentences: usize,
    /// A trailing chunk below this many tokens is widened backwards
    pub min_chunk_tokens: usize,
}

impl Default for SentenceChunkOptions {
    fn default() -> Self {
        Self {
            overlap_sentences: 1,
            min_chunk_tokens: 100,
        }
    }
}

/// Sentence index range `[start, end)` plus its token count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SentenceSpan {
    start: usize,
    end: usize,
    tokens: usize,
}

/// Group sentences greedily into chunks that fit the token budget
///
/// Each chunk starts at a sentence cursor and takes sentences while the
/// running token count (special tokens excluded) stays within
/// `max_input_tokens - max_output_tokens`. The next chunk starts at
/// `max(start + 1, end - overlap_sentences)` so the cursor always moves
/// forward. A sentence that alone exceeds the budget becomes its own chunk
/// instead of producing an empty one. Chunking stops once a chunk reaches
/// the last sentence.
///
/// A trailing chunk under `min_chunk_tokens` is not merged into its
/// predecessor, since the predecessor was closed because the next sentence
/// did not fit. Instead its start moves back over already covered sentences
/// while the budget allows, so the last model call still gets a full
/// context. No chunk exceeds the budget unless it is a single oversized
/// sentence.
///
/// # Examples
///
/// ```
/// use qagen_core::chunking::{chunk_by_sentences, SentenceChunkOptions, TokenBudget};
/// use qagen_core::tokenizer::WhitespaceTokenizer;
///
/// let tokenizer = WhitespaceTokenizer::new();
/// let text = "One two three. Four five six. Seven eight nine.";
/// let chunks = chunk_by_sentences(
///     text,
///     &tokenizer,
///     TokenBudget::new(7, 1),
///     SentenceChunkOptions { overlap_sentences: 0, min_chunk_tokens: 0 },
/// )
/// .unwrap();
/// assert_eq!(chunks, vec!["One two three. Four five six.", "Seven eight nine."]);
/// ```
pub fn chunk_by_sentences(
    text: &str,
    tokenizer: &dyn Tokenizer,
    budget: TokenBudget,
    options: SentenceChunkOptions,
) -> Result<Vec<String>> {
    let sentences = split_into_sentences(text);
    if sentences.is_empty() {
        return Ok(Vec::new());
    }

    let counts = sentences
        .iter()
        .map(|sentence| tokenizer.count_tokens(sentence))
        .collect::<Result<Vec<usize>>>()?;
    let max_chunk_tokens = budget.chunk_tokens();

    let mut spans = plan_spans(&counts, max_chunk_tokens, options.overlap_sentences);
    backfill_short_tail(&mut spans, &counts, max_chunk_tokens, options.min_chunk_tokens);

    Ok(spans
        .iter()
        .enumerate()
        .map(|(index, span)| {
            let chunk = sentences[span.start..span.end].join(" ").trim().to_string();
            debug!(
                chunk = index,
                sentences = span.end - span.start,
                tokens = span.tokens,
                chars = chunk.len(),
                "Built sentence chunk"
            );
            chunk
        })
        .collect())
}

fn plan_spans(counts: &[usize], max_chunk_tokens: usize, overlap: usize) -> Vec<SentenceSpan> {
    let total = counts.len();
    let mut spans = Vec::new();
    let mut start = 0;

    while start < total {
        let mut end = start;
        let mut tokens = 0;
        while end < total && tokens + counts[end] <= max_chunk_tokens {
            tokens += counts[end];
            end += 1;
        }

        if end == start {
            warn!(
                sentence = start,
                tokens = counts[start],
                budget = max_chunk_tokens,
                "Sentence exceeds the chunk token budget, emitting it alone"
            );
            tokens = counts[start];
            end = start + 1;
        }

        spans.push(SentenceSpan { start, end, tokens });

        if end >= total {
            break;
        }
        start = (start + 1).max(end.saturating_sub(overlap));
    }

    spans
}

/// Widen a short last span backwards, staying within the budget and
/// strictly after the previous span's start
fn backfill_short_tail(
    spans: &mut [SentenceSpan],
    counts: &[usize],
    max_chunk_tokens: usize,
    min_chunk_tokens: usize,
) {
    let [.., previous, last] = spans else {
        return;
    };
    if last.tokens >= min_chunk_tokens {
        return;
    }

    let tail_tokens = last.tokens;
    while last.start > previous.start + 1 && last.tokens + counts[last.start - 1] <= max_chunk_tokens {
        last.start -= 1;
        last.tokens += counts[last.start];
    }
    debug!(
        tail_tokens,
        widened_tokens = last.tokens,
        start = last.start,
        "Widened short trailing chunk"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WhitespaceTokenizer;

    fn options(overlap_sentences: usize, min_chunk_tokens: usize) -> SentenceChunkOptions {
        SentenceChunkOptions {
            overlap_sentences,
            min_chunk_tokens,
        }
    }

    #[test]
    fn test_split_keeps_punctuation() {
        let sentences = split_into_sentences("Hello there!  How are you?\nFine.");
        assert_eq!(sentences, vec!["Hello there!", "How are you?", "Fine."]);
    }

    #[test]
    fn test_split_does_not_break_without_whitespace() {
        assert_eq!(split_into_sentences("version 1.2.3 is out"), vec!["version 1.2.3 is out"]);
        assert_eq!(split_into_sentences("Wait... what?"), vec!["Wait...", "what?"]);
    }

    #[test]
    fn test_split_blank() {
        assert!(split_into_sentences("   ").is_empty());
    }

    #[test]
    fn test_single_chunk_when_everything_fits() {
        let tokenizer = WhitespaceTokenizer::new();
        let text = "A b c. D e f. G h i.";
        let chunks = chunk_by_sentences(text, &tokenizer, TokenBudget::new(100, 10), options(1, 0)).unwrap();
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn test_overlap_repeats_sentences() {
        let tokenizer = WhitespaceTokenizer::new();
        // Every sentence is two tokens, budget of four fits two sentences
        let text = "S1 a. S2 b. S3 c. S4 d.";
        let chunks = chunk_by_sentences(text, &tokenizer, TokenBudget::new(5, 1), options(1, 0)).unwrap();
        assert_eq!(chunks, vec!["S1 a. S2 b.", "S2 b. S3 c.", "S3 c. S4 d."]);
    }

    #[test]
    fn test_oversized_sentence_is_not_dropped() {
        let tokenizer = WhitespaceTokenizer::new();
        let text = "one two three four five six. Short one.";
        let chunks = chunk_by_sentences(text, &tokenizer, TokenBudget::new(4, 1), options(0, 0)).unwrap();
        assert_eq!(chunks, vec!["one two three four five six.", "Short one."]);
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn test_short_tail_is_widened_within_budget() {
        let tokenizer = WhitespaceTokenizer::new();
        let text = "a b c. d e f. g.";
        let chunks = chunk_by_sentences(text, &tokenizer, TokenBudget::new(7, 1), options(0, 3)).unwrap();
        assert_eq!(chunks, vec!["a b c. d e f.", "d e f. g."]);
    }

    #[test]
    fn test_short_tail_never_reaches_previous_start() {
        let tokenizer = WhitespaceTokenizer::new();
        let text = "a b c. d e f. g.";
        let chunks = chunk_by_sentences(text, &tokenizer, TokenBudget::new(100, 1), options(0, 500)).unwrap();
        assert_eq!(chunks, vec![text.to_string()]);

        // Widening stops at the budget even when the tail stays short
        let chunks = chunk_by_sentences("a b c d e f. g h. i.", &tokenizer, TokenBudget::new(7, 1), options(0, 5))
            .unwrap();
        assert_eq!(chunks, vec!["a b c d e f.", "g h. i."]);
    }

    #[test]
    fn test_tokenizer_errors_propagate() {
        struct Failing;

        impl Tokenizer for Failing {
            fn encode(&self, _text: &str, _add_special_tokens: bool) -> Result<Vec<u32>> {
                Err(crate::QagenError::chunking("broken"))
            }

            fn decode(&self, _tokens: &[u32]) -> Result<String> {
                Ok(String::new())
            }
        }

        let result = chunk_by_sentences("One. Two.", &Failing, TokenBudget::new(10, 1), options(0, 0));
        assert!(matches!(result, Err(crate::QagenError::Chunking { .. })));
    }

    #[test]
    fn test_overlap_larger_than_chunk_still_progresses() {
        let tokenizer = WhitespaceTokenizer::new();
        let text = "a. b. c. d. e.";
        let chunks = chunk_by_sentences(text, &tokenizer, TokenBudget::new(3, 1), options(10, 0)).unwrap();
        assert_eq!(chunks, vec!["a. b.", "b. c.", "c. d.", "d. e."]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let tokenizer = WhitespaceTokenizer::new();
        let chunks = chunk_by_sentences("", &tokenizer, TokenBudget::new(10, 1), options(1, 0)).unwrap();
        assert!(chunks.is_empty());
    }
}
