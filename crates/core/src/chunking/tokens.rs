//! Fixed token windows with overlap

use super::TokenBudget;
use crate::error::Result;
use crate::tokenizer::Tokenizer;
use tracing::debug;

/// Options for [`chunk_by_tokens`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenChunkOptions {
    /// Tokens shared between consecutive windows
    pub overlap_tokens: usize,
    /// A trailing window below this many tokens is merged into its predecessor
    pub min_chunk_tokens: usize,
}

impl Default for TokenChunkOptions {
    fn default() -> Self {
        Self {
            overlap_tokens: 50,
            min_chunk_tokens: 100,
        }
    }
}

/// Slide a token window of `max_input_tokens - max_output_tokens` over the text
///
/// Windows advance by the budget minus the overlap (at least one token).
/// When the final window is shorter than `min_chunk_tokens` it is not
/// emitted on its own; the previous chunk is extended to the end of the
/// text instead, so that chunk may exceed the budget.
pub fn chunk_by_tokens(
    text: &str,
    tokenizer: &dyn Tokenizer,
    budget: TokenBudget,
    options: TokenChunkOptions,
) -> Result<Vec<String>> {
    let tokens = tokenizer.encode(text, false)?;
    let total = tokens.len();
    let window = budget.chunk_tokens();
    let step = window.saturating_sub(options.overlap_tokens).max(1);
    let min_tokens = options.min_chunk_tokens.min(window);

    let mut chunks: Vec<String> = Vec::new();
    let mut previous_start = 0;
    let mut start = 0;

    while start < total {
        let end = (start + window).min(total);

        if end - start < min_tokens && !chunks.is_empty() {
            let merged = tokenizer.decode(&tokens[previous_start..total])?;
            if let Some(last) = chunks.last_mut() {
                *last = merged.trim().to_string();
            }
            debug!(
                tail_tokens = end - start,
                merged_tokens = total - previous_start,
                "Merged short trailing token window"
            );
            break;
        }

        let chunk = tokenizer.decode(&tokens[start..end])?.trim().to_string();
        debug!(
            chunk = chunks.len(),
            tokens = end - start,
            chars = chunk.len(),
            "Built token chunk"
        );
        chunks.push(chunk);

        if end == total {
            break;
        }
        previous_start = start;
        start += step;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WhitespaceTokenizer;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_windows_with_overlap() {
        let tokenizer = WhitespaceTokenizer::new();
        let text = words(10);
        let chunks = chunk_by_tokens(
            &text,
            &tokenizer,
            TokenBudget::new(5, 1),
            TokenChunkOptions {
                overlap_tokens: 1,
                min_chunk_tokens: 0,
            },
        )
        .unwrap();
        assert_eq!(
            chunks,
            vec!["w0 w1 w2 w3", "w3 w4 w5 w6", "w6 w7 w8 w9"]
        );
    }

    #[test]
    fn test_short_tail_merges_into_previous() {
        let tokenizer = WhitespaceTokenizer::new();
        let text = words(9);
        let chunks = chunk_by_tokens(
            &text,
            &tokenizer,
            TokenBudget::new(5, 1),
            TokenChunkOptions {
                overlap_tokens: 0,
                min_chunk_tokens: 2,
            },
        )
        .unwrap();
        assert_eq!(chunks, vec!["w0 w1 w2 w3", "w4 w5 w6 w7 w8"]);
    }

    #[test]
    fn test_short_single_window_is_kept() {
        let tokenizer = WhitespaceTokenizer::new();
        let chunks = chunk_by_tokens(
            "just three words",
            &tokenizer,
            TokenBudget::new(512, 100),
            TokenChunkOptions::default(),
        )
        .unwrap();
        assert_eq!(chunks, vec!["just three words"]);
    }

    #[test]
    fn test_overlap_not_smaller_than_window_still_progresses() {
        let tokenizer = WhitespaceTokenizer::new();
        let text = words(4);
        let chunks = chunk_by_tokens(
            &text,
            &tokenizer,
            TokenBudget::new(3, 1),
            TokenChunkOptions {
                overlap_tokens: 5,
                min_chunk_tokens: 0,
            },
        )
        .unwrap();
        assert_eq!(chunks, vec!["w0 w1", "w1 w2", "w2 w3"]);
    }

    #[test]
    fn test_empty_text() {
        let tokenizer = WhitespaceTokenizer::new();
        let chunks = chunk_by_tokens("", &tokenizer, TokenBudget::new(10, 2), TokenChunkOptions::default())
            .unwrap();
        assert!(chunks.is_empty());
    }
}
