//! Chunking properties over generated documents

use qagen_core::chunking::{
    chunk_by_sentences, chunk_by_tokens, split_into_sentences, Chunker, SentenceChunkOptions,
    TokenBudget, TokenChunkOptions,
};
use qagen_core::config::{ChunkingConfig, ModelProfile};
use qagen_core::tokenizer::{Tokenizer, WhitespaceTokenizer};
use std::collections::HashMap;

/// Deterministic linear congruential generator
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    fn range(&mut self, low: usize, high: usize) -> usize {
        low + (self.next() as usize) % (high - low + 1)
    }
}

/// Document of `count` unique sentences, each 2 to `max_words + 1` words long
fn document(seed: u64, count: usize, max_words: usize) -> (String, Vec<String>) {
    let mut rng = Lcg(seed);
    let sentences: Vec<String> = (0..count)
        .map(|i| {
            let words: Vec<String> = (0..rng.range(1, max_words))
                .map(|_| format!("w{}", rng.range(0, 40)))
                .collect();
            let end = ['.', '!', '?'][rng.range(0, 2)];
            format!("S{} {}{}", i, words.join(" "), end)
        })
        .collect();
    (sentences.join(" "), sentences)
}

/// Sentence indices covered by each chunk
fn chunk_indices(chunks: &[String], sentences: &[String]) -> Vec<Vec<usize>> {
    let index: HashMap<&str, usize> = sentences
        .iter()
        .enumerate()
        .map(|(i, s)| (s.as_str(), i))
        .collect();
    chunks
        .iter()
        .map(|chunk| {
            split_into_sentences(chunk)
                .into_iter()
                .map(|s| index[s])
                .collect()
        })
        .collect()
}

#[test]
fn test_sentence_chunks_cover_every_sentence_in_order() {
    for seed in 0..40 {
        let (text, sentences) = document(seed, 25, 12);
        let tokenizer = WhitespaceTokenizer::new();
        let overlap = (seed % 3) as usize;
        let chunks = chunk_by_sentences(
            &text,
            &tokenizer,
            TokenBudget::new(40, 10),
            SentenceChunkOptions {
                overlap_sentences: overlap,
                min_chunk_tokens: 8,
            },
        )
        .unwrap();
        let indices = chunk_indices(&chunks, &sentences);

        // Each chunk is a contiguous run of sentences
        for run in &indices {
            assert!(!run.is_empty());
            assert!(run.windows(2).all(|w| w[1] == w[0] + 1), "seed {}", seed);
        }

        // Chunk starts move strictly forward
        let starts: Vec<usize> = indices.iter().map(|run| run[0]).collect();
        assert!(starts.windows(2).all(|w| w[1] > w[0]), "seed {}", seed);

        // Nothing is skipped between chunks and the text is fully covered
        assert_eq!(starts[0], 0);
        for pair in indices.windows(2) {
            assert!(pair[1][0] <= pair[0][pair[0].len() - 1] + 1, "seed {}", seed);
        }
        assert_eq!(*indices.last().unwrap().last().unwrap(), sentences.len() - 1);
    }
}

#[test]
fn test_sentence_chunks_respect_token_budget() {
    for seed in 100..140 {
        let (text, _) = document(seed, 30, 20);
        let tokenizer = WhitespaceTokenizer::new();
        let budget = TokenBudget::new(30, 6);
        let chunks = chunk_by_sentences(
            &text,
            &tokenizer,
            budget,
            SentenceChunkOptions {
                overlap_sentences: 1,
                min_chunk_tokens: 5,
            },
        )
        .unwrap();

        for (i, chunk) in chunks.iter().enumerate() {
            let tokens = tokenizer.count_tokens(chunk).unwrap();
            let single_sentence = split_into_sentences(chunk).len() == 1;
            // Only a lone oversized sentence may exceed the budget
            assert!(
                tokens <= budget.chunk_tokens() || single_sentence,
                "seed {} chunk {} has {} tokens",
                seed,
                i,
                tokens
            );
        }
    }
}

#[test]
fn test_oversized_sentences_still_make_progress() {
    let sentences: Vec<String> = (0..12)
        .map(|i| format!("Sentence {} has six words here.", i))
        .collect();
    let text = sentences.join(" ");
    let tokenizer = WhitespaceTokenizer::new();
    let chunks = chunk_by_sentences(
        &text,
        &tokenizer,
        TokenBudget::new(6, 2),
        SentenceChunkOptions {
            overlap_sentences: 3,
            min_chunk_tokens: 0,
        },
    )
    .unwrap();

    // Every sentence has six tokens against a budget of four, so each becomes its own chunk
    assert_eq!(chunks, sentences);
}

#[test]
fn test_token_windows_cover_the_text() {
    for seed in 200..230 {
        let (text, _) = document(seed, 20, 15);
        let tokenizer = WhitespaceTokenizer::new();
        let words: Vec<&str> = text.split_whitespace().collect();
        let budget = TokenBudget::new(32, 8);
        let overlap = (seed % 8) as usize;
        let chunks = chunk_by_tokens(
            &text,
            &tokenizer,
            budget,
            TokenChunkOptions {
                overlap_tokens: overlap,
                min_chunk_tokens: 6,
            },
        )
        .unwrap();

        let step = budget.chunk_tokens() - overlap;
        for (i, chunk) in chunks.iter().enumerate() {
            let chunk_words: Vec<&str> = chunk.split_whitespace().collect();
            let start = i * step;
            // Each window is the token slice starting at its step offset
            assert_eq!(chunk_words[..], words[start..start + chunk_words.len()], "seed {}", seed);
            if i + 1 < chunks.len() {
                assert_eq!(chunk_words.len(), budget.chunk_tokens());
            }
        }

        let last: Vec<&str> = chunks.last().unwrap().split_whitespace().collect();
        assert_eq!(last.last(), words.last());
    }
}

#[test]
fn test_blank_documents_produce_no_chunks() {
    let tokenizer = WhitespaceTokenizer::new();
    let budget = TokenBudget::new(16, 4);
    assert!(chunk_by_sentences(" \n ", &tokenizer, budget, SentenceChunkOptions::default())
        .unwrap()
        .is_empty());
    assert!(chunk_by_tokens("", &tokenizer, budget, TokenChunkOptions::default())
        .unwrap()
        .is_empty());
}

#[test]
fn test_default_settings_keep_every_chunk_within_model_budget() {
    for model in ["google/flan-t5-base", "google/flan-t5-large", "google/flan-t5-xl"] {
        let profile = ModelProfile::for_model(model);
        let chunker = Chunker::from_config(&ChunkingConfig::default(), &profile).unwrap();
        let budget = TokenBudget::from(&profile).chunk_tokens();

        for seed in 300..320 {
            let (text, sentences) = document(seed, 400, 30);
            let chunks = chunker.chunk(&text).unwrap();
            assert!(!chunks.is_empty());

            for (i, chunk) in chunks.iter().enumerate() {
                let tokens = chunker.count_tokens(chunk).unwrap();
                assert!(
                    tokens <= budget,
                    "{} seed {} chunk {} has {} tokens against {}",
                    model,
                    seed,
                    i,
                    tokens,
                    budget
                );
            }

            let indices = chunk_indices(&chunks, &sentences);
            assert_eq!(*indices.last().unwrap().last().unwrap(), sentences.len() - 1);
        }
    }
}
