//! Sentence-aware, overlap-linked text chunker.
//!
//! Splits normalized document text into [`Chunk`]s bounded by a word
//! budget. Consecutive chunks share an overlap of words so that the text
//! around every boundary survives in at least one chunk intact.
//!
//! # Algorithm
//!
//! 1. Split the text into sentences on runs of `.`, `!` or `?` that end a
//!    sentence (the run is followed by whitespace or the end of the text).
//!    The punctuation stays attached to its sentence, so decimals such as
//!    `95.5` and list markers such as `1.` are not torn apart.
//! 2. Accumulate the words of each sentence into the current chunk.
//! 3. When the next sentence would push the chunk past `max_words`, close
//!    the chunk and seed the next one with its last `overlap_words` words,
//!    followed by the sentence that triggered the rollover.
//! 4. A sentence longer than `max_words` on its own is hard-split into
//!    windows of `max_words` words first.
//!
//! # Example
//!
//! ```rust
//! use lidia_context_core::chunk::chunk_text;
//!
//! let chunks = chunk_text("Primeira frase. Segunda frase!", 1000, 100);
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].ordinal, 0);
//! ```

use crate::models::Chunk;

/// Split text into sentences, keeping each terminator run with its sentence.
///
/// Fragments that are empty after trimming are dropped.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if matches!(next, '.' | '!' | '?') {
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        let ends_sentence = match chars.peek() {
            Some(&(_, next)) => next.is_whitespace(),
            None => true,
        };
        if ends_sentence {
            push_trimmed(&mut sentences, &text[start..end]);
            start = end;
        }
    }
    push_trimmed(&mut sentences, &text[start..]);
    sentences
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, fragment: &'a str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        out.push(trimmed);
    }
}

/// Split text into word-budgeted chunks with `overlap_words` of overlap.
///
/// # Guarantees
///
/// - Ordinals are contiguous: `0, 1, 2, …, N-1`.
/// - No chunk has more than `max_words` words, except that the overlap seed
///   plus one budget-sized sentence window may reach
///   `overlap_words + max_words`.
/// - For every pair of consecutive chunks, chunk `i + 1` begins with the
///   last `overlap_words` words of chunk `i`.
/// - Empty or whitespace-only text yields no chunks.
pub fn chunk_text(text: &str, max_words: usize, overlap_words: usize) -> Vec<Chunk> {
    let max_words = max_words.max(1);
    let overlap_words = overlap_words.min(max_words - 1);

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for sentence in split_sentences(text) {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        for window in words.chunks(max_words) {
            if !current.is_empty() && current.len() + window.len() > max_words {
                let seed_start = current.len().saturating_sub(overlap_words);
                let seed = current[seed_start..].to_vec();
                chunks.push(make_chunk(chunks.len(), &current));
                current = seed;
            }
            current.extend_from_slice(window);
        }
    }

    if !current.is_empty() {
        chunks.push(make_chunk(chunks.len(), &current));
    }

    chunks
}

fn make_chunk(ordinal: usize, words: &[&str]) -> Chunk {
    Chunk {
        text: words.join(" "),
        ordinal,
        relevance_score: 0,
        word_count: words.len(),
    }
}
