//! Character window chunking, used when no tokenizer applies

/// Default share of a character window repeated in the next one
pub const DEFAULT_OVERLAP_RATIO: f64 = 0.25;

/// Slide a window of `chunk_size` characters with `overlap` characters of
/// backward overlap
///
/// Works on `char` boundaries so multi-byte text is never split inside a
/// code point. The window advances by at least one character.
///
/// # Examples
///
/// ```
/// use qagen_core::chunking::chunk_and_overlap;
///
/// let chunks = chunk_and_overlap("abcdefghij", 4, 1);
/// assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
/// ```
pub fn chunk_and_overlap(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let size = chunk_size.max(1);
    let step = size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

/// Overlap in characters for a window size and ratio
pub fn overlap_for(chunk_size: usize, ratio: f64) -> usize {
    (chunk_size as f64 * ratio.clamp(0.0, 1.0)) as usize
}
