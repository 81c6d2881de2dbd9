//! Text splitting strategies for child chunks.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`]: splits by character count with configurable overlap
//! - [`RecursiveChunker`]: splits hierarchically by paragraphs, sentences, then words
//!
//! Sizes are measured in characters, never bytes, so multi-byte text is never
//! cut inside a code point.

/// A strategy for splitting a fragment's text into smaller pieces.
pub trait Chunker: Send + Sync {
    /// Split `text` into chunks.
    ///
    /// Returns an empty `Vec` for empty text.
    fn split(&self, text: &str) -> Vec<String>;
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// # Example
///
/// ```rust,ignore
/// use timeline_rag::{Chunker, FixedSizeChunker};
///
/// let chunker = FixedSizeChunker::new(50, 0);
/// let pieces = chunker.split(&fragment.content);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size: chunk_size.max(1), chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn split(&self, text: &str) -> Vec<String> {
        split_by_size(text, self.chunk_size, self.chunk_overlap)
    }
}

/// Splits text hierarchically: paragraphs → sentences → words.
///
/// First splits by paragraph separators (`\n\n`). If a paragraph exceeds
/// `chunk_size`, splits by sentence boundaries (`. `, `! `, `? `). If a
/// sentence still exceeds `chunk_size`, splits by word boundaries and finally
/// by character count.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: overlap used when a piece has to be cut by character count
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size: chunk_size.max(1), chunk_overlap }
    }
}

const SEPARATORS: [&str; 5] = ["\n\n", ". ", "! ", "? ", " "];

impl Chunker for RecursiveChunker {
    fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        split_and_merge(text, self.chunk_size, self.chunk_overlap, &SEPARATORS)
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .collect()
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split text by a separator, then merge segments into chunks that respect
/// `chunk_size`. If a segment exceeds `chunk_size`, it is split further
/// using the next-level separator.
fn split_and_merge(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    if char_len(text) <= chunk_size || separators.is_empty() {
        return split_by_size(text, chunk_size, chunk_overlap);
    }

    let separator = separators[0];
    let remaining_separators = &separators[1..];
    let segments = split_keeping_separator(text, separator);

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    let flush = |current: &mut String, chunks: &mut Vec<String>| {
        if char_len(current) > chunk_size {
            chunks.extend(split_and_merge(current, chunk_size, chunk_overlap, remaining_separators));
        } else if !current.is_empty() {
            chunks.push(std::mem::take(current));
        }
        current.clear();
    };

    for segment in segments {
        let segment_len = char_len(segment);
        if current.is_empty() || current_len + segment_len <= chunk_size {
            current.push_str(segment);
            current_len += segment_len;
        } else {
            flush(&mut current, &mut chunks);
            current.push_str(segment);
            current_len = segment_len;
        }
    }
    flush(&mut current, &mut chunks);

    chunks
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Simple character-based splitting with overlap.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(chunk_overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_size_respects_char_boundaries() {
        let chunker = FixedSizeChunker::new(3, 0);
        assert_eq!(chunker.split("héllo wörld"), vec!["hél", "lo ", "wör", "ld"]);
    }

    #[test]
    fn fixed_size_overlap_repeats_tail() {
        let chunker = FixedSizeChunker::new(4, 2);
        assert_eq!(chunker.split("abcdefgh"), vec!["abcd", "cdef", "efgh"]);
    }

    #[test]
    fn overlap_not_smaller_than_size_still_terminates() {
        let chunker = FixedSizeChunker::new(2, 5);
        assert_eq!(chunker.split("abc"), vec!["ab", "bc"]);
    }

    #[test]
    fn recursive_prefers_sentence_boundaries() {
        let chunker = RecursiveChunker::new(20, 0);
        let chunks = chunker.split("First sentence. Second one here. Third.");
        assert_eq!(chunks, vec!["First sentence. ", "Second one here. ", "Third."]);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert!(FixedSizeChunker::new(10, 0).split("").is_empty());
        assert!(RecursiveChunker::new(10, 0).split("").is_empty());
    }
}
