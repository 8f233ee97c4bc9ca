//! TF-IDF cosine similarity between two documents
//!
//! The vocabulary and document frequencies are fitted on the two documents
//! being compared. Terms are lowercase words of at least two word characters,
//! idf is smoothed as `ln((1 + n) / (1 + df)) + 1` and each vector is
//! L2-normalised before the dot product.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static TERM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("term pattern is valid"));

fn term_counts(text: &str) -> HashMap<String, f64> {
    let lowered = text.to_lowercase();
    let mut counts = HashMap::new();
    for m in TERM.find_iter(&lowered) {
        *counts.entry(m.as_str().to_string()).or_insert(0.0) += 1.0;
    }
    counts
}

fn weighted(counts: &HashMap<String, f64>, idf: &HashMap<&str, f64>) -> HashMap<String, f64> {
    let mut vector: HashMap<String, f64> = counts
        .iter()
        .map(|(term, tf)| (term.clone(), tf * idf.get(term.as_str()).copied().unwrap_or(1.0)))
        .collect();

    let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        vector.values_mut().for_each(|w| *w /= norm);
    }
    vector
}

/// Cosine similarity of the TF-IDF vectors of `a` and `b`, in `[0, 1]`
///
/// Returns 0 when neither text contains a term.
///
/// ```
/// use qagen_core::quality::tfidf_cosine;
///
/// assert!((tfidf_cosine("printing costs", "Printing costs!") - 1.0).abs() < 1e-9);
/// assert_eq!(tfidf_cosine("ink", "paper"), 0.0);
/// assert_eq!(tfidf_cosine("", "a"), 0.0);
/// ```
pub fn tfidf_cosine(a: &str, b: &str) -> f64 {
    let docs = [term_counts(a), term_counts(b)];
    if docs.iter().all(HashMap::is_empty) {
        return 0.0;
    }

    let n = docs.len() as f64;
    let mut df: HashMap<&str, f64> = HashMap::new();
    for doc in &docs {
        for term in doc.keys() {
            *df.entry(term.as_str()).or_insert(0.0) += 1.0;
        }
    }
    let idf: HashMap<&str, f64> = df
        .into_iter()
        .map(|(term, df)| (term, ((1.0 + n) / (1.0 + df)).ln() + 1.0))
        .collect();

    let va = weighted(&docs[0], &idf);
    let vb = weighted(&docs[1], &idf);

    let dot: f64 = va
        .iter()
        .filter_map(|(term, wa)| vb.get(term).map(|wb| wa * wb))
        .sum();

    dot.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_documents() {
        let text = "The EcoTank system drastically reduces printing costs.";
        assert!((tfidf_cosine(text, text) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_documents() {
        assert_eq!(tfidf_cosine("ink tanks", "paper trays"), 0.0);
    }

    #[test]
    fn test_single_letter_words_are_ignored() {
        // "a" and "I" are below the two-character term length
        assert_eq!(tfidf_cosine("a I", "a I"), 0.0);
    }

    #[test]
    fn test_partial_overlap_matches_reference_value() {
        // Shared term "ink" has idf 1, the others ln(1.5) + 1
        let other = (1.5f64).ln() + 1.0;
        let expected = 1.0 / (1.0 + other * other);
        let score = tfidf_cosine("ink tank", "ink tray");
        assert!((score - expected).abs() < 1e-9, "{} vs {}", score, expected);
    }

    #[test]
    fn test_one_empty_document() {
        assert_eq!(tfidf_cosine("printing costs", ""), 0.0);
    }
}
