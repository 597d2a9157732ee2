//! Bounded context reduction.
//!
//! Turns normalized document text into a [`Context`] no longer than
//! `max_length` characters.
//!
//! # Selection algorithm
//!
//! 1. If the text already fits, return it unchanged as the only chunk.
//! 2. Chunk the text (see [`crate::chunk`]).
//! 3. With two chunks or fewer, join them with a blank line and
//!    hard-truncate to `max_length`.
//! 4. Otherwise score every chunk, sort by score (desc) then ordinal (asc),
//!    and append `[Seção N]` sections greedily until the next section
//!    would exceed `max_length`.
//! 5. If not even the best chunk fits, emit it truncated so the whole
//!    section (label included) fits.
//!
//! Lengths are counted in characters, never bytes.

use serde::Deserialize;

use crate::chunk::chunk_text;
use crate::models::{Chunk, Context};
use crate::score::{score_chunks, ScoringPolicy};

const SECTION_SEPARATOR: &str = "\n\n";

/// Order in which selected sections are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOrder {
    /// Highest-scoring sections first.
    #[default]
    Relevance,
    /// Selected sections re-ordered as they appear in the document.
    Document,
}

/// Reduction parameters, decoupled from application config.
#[derive(Debug, Clone)]
pub struct ReduceParams {
    /// Hard cap on context size, in characters.
    pub max_length: usize,
    pub max_chunk_words: usize,
    pub chunk_overlap_words: usize,
    pub order: SelectionOrder,
    /// Label prefixed to each section, followed by its 1-based ordinal.
    pub section_label: String,
}

impl Default for ReduceParams {
    fn default() -> Self {
        Self {
            max_length: 4000,
            max_chunk_words: 1000,
            chunk_overlap_words: 100,
            order: SelectionOrder::Relevance,
            section_label: "Seção".to_string(),
        }
    }
}

/// Reduce `text` to a context of at most `params.max_length` characters.
pub fn reduce(text: &str, params: &ReduceParams, policy: &ScoringPolicy) -> Context {
    let max_length = params.max_length;

    if char_len(text) <= max_length {
        return Context {
            text: text.to_string(),
            selected: vec![0],
            total_chunks: 1,
            truncated: false,
        };
    }

    let mut chunks = chunk_text(text, params.max_chunk_words, params.chunk_overlap_words);
    let total_chunks = chunks.len();

    if total_chunks <= 2 {
        let joined = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(SECTION_SEPARATOR);
        let (text, truncated) = truncate_chars(&joined, max_length);
        return Context {
            text: text.to_string(),
            selected: chunks.iter().map(|c| c.ordinal).collect(),
            total_chunks,
            truncated,
        };
    }

    score_chunks(&mut chunks, policy);
    chunks.sort_by(|a, b| {
        b.relevance_score
            .cmp(&a.relevance_score)
            .then(a.ordinal.cmp(&b.ordinal))
    });

    let mut picked: Vec<(usize, String)> = Vec::new();
    let mut used = 0usize;
    for chunk in &chunks {
        let section = render_section(&params.section_label, chunk);
        let cost = char_len(&section)
            + if picked.is_empty() {
                0
            } else {
                SECTION_SEPARATOR.len()
            };
        if used + cost > max_length {
            break;
        }
        used += cost;
        picked.push((chunk.ordinal, section));
    }

    if picked.is_empty() {
        let best = &chunks[0];
        let label = section_label(&params.section_label, best.ordinal);
        let room = max_length.saturating_sub(char_len(&label) + 1);
        let (body, _) = truncate_chars(&best.text, room);
        let text = if room == 0 {
            truncate_chars(&label, max_length).0.to_string()
        } else {
            format!("{}\n{}", label, body)
        };
        return Context {
            text,
            selected: vec![best.ordinal],
            total_chunks,
            truncated: true,
        };
    }

    if params.order == SelectionOrder::Document {
        picked.sort_by_key(|(ordinal, _)| *ordinal);
    }

    Context {
        selected: picked.iter().map(|(ordinal, _)| *ordinal).collect(),
        text: picked
            .into_iter()
            .map(|(_, section)| section)
            .collect::<Vec<_>>()
            .join(SECTION_SEPARATOR),
        total_chunks,
        truncated: false,
    }
}

fn section_label(label: &str, ordinal: usize) -> String {
    format!("[{} {}]", label, ordinal + 1)
}

fn render_section(label: &str, chunk: &Chunk) -> String {
    format!("{}\n{}", section_label(label, chunk.ordinal), chunk.text)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Cut `s` to at most `max_chars` characters, on a char boundary.
fn truncate_chars(s: &str, max_chars: usize) -> (&str, bool) {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&s[..byte_idx], true),
        None => (s, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_length: usize, max_chunk_words: usize, overlap: usize) -> ReduceParams {
        ReduceParams {
            max_length,
            max_chunk_words,
            chunk_overlap_words: overlap,
            ..ReduceParams::default()
        }
    }

    fn filler_sentences(count: usize) -> Vec<String> {
        (0..count)
            .map(|_| "lorem ipsum dolor sit amet consectetur adipiscing elit sed do.".to_string())
            .collect()
    }

    #[test]
    fn short_text_returned_unchanged() {
        let text = "Um texto curto.\n\nCom dois parágrafos.";
        let ctx = reduce(text, &params(4000, 1000, 100), &ScoringPolicy::default());
        assert_eq!(ctx.text, text);
        assert!(!ctx.truncated);
        assert_eq!(ctx.total_chunks, 1);
    }

    #[test]
    fn two_chunks_are_joined_and_truncated() {
        let text = filler_sentences(15).join(" ");
        let ctx = reduce(&text, &params(200, 100, 10), &ScoringPolicy::default());
        assert_eq!(ctx.total_chunks, 2);
        assert_eq!(ctx.len(), 200);
        assert!(ctx.truncated);
        assert!(!ctx.text.contains("[Seção"));
    }

    #[test]
    fn best_scoring_sections_come_first() {
        let mut sentences = filler_sentences(40);
        sentences[25] = "A conclusão mostra resultado de 95% na análise dos dados.".to_string();
        let text = sentences.join(" ");
        let ctx = reduce(&text, &params(400, 50, 5), &ScoringPolicy::default());
        assert!(ctx.total_chunks > 2);
        assert!(ctx.len() <= 400);
        assert!(ctx.text.contains("conclusão mostra resultado"));
        let first_label = ctx.text.lines().next().unwrap_or_default();
        let expected = format!("[Seção {}]", ctx.selected[0] + 1);
        assert_eq!(first_label, expected);
        assert!(ctx.text.starts_with(&expected));
    }

    #[test]
    fn ties_keep_document_order() {
        let text = filler_sentences(40).join(" ");
        let ctx = reduce(&text, &params(800, 50, 5), &ScoringPolicy::default());
        let mut sorted = ctx.selected.clone();
        sorted.sort();
        assert_eq!(ctx.selected, sorted);
        assert_eq!(ctx.selected[0], 0);
    }

    #[test]
    fn document_order_reorders_selection() {
        let mut sentences = filler_sentences(40);
        sentences[35] = "Resultado e conclusão com 12.5 pontos na tabela.".to_string();
        let text = sentences.join(" ");
        let mut p = params(900, 50, 5);
        let relevance = reduce(&text, &p, &ScoringPolicy::default());
        p.order = SelectionOrder::Document;
        let document = reduce(&text, &p, &ScoringPolicy::default());

        assert_ne!(relevance.selected[0], 0);
        let mut sorted = relevance.selected.clone();
        sorted.sort();
        assert_eq!(document.selected, sorted);
        assert_eq!(relevance.len(), document.len());
    }

    #[test]
    fn oversized_best_chunk_is_truncated_to_fit() {
        let text = filler_sentences(300).join(" ");
        let ctx = reduce(&text, &params(500, 1000, 100), &ScoringPolicy::default());
        assert_eq!(ctx.total_chunks, 4);
        assert!(ctx.truncated);
        assert!(ctx.len() <= 500);
        assert!(ctx.text.starts_with("[Seção 1]\n"));
    }

    #[test]
    fn output_never_exceeds_cap() {
        let text = filler_sentences(500).join(" ");
        for max_length in [1, 10, 50, 333, 1000, 4000] {
            let ctx = reduce(&text, &params(max_length, 40, 4), &ScoringPolicy::default());
            assert!(ctx.len() <= max_length, "{} > {}", ctx.len(), max_length);
        }
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let (cut, truncated) = truncate_chars("ação", 2);
        assert_eq!(cut, "aç");
        assert!(truncated);
        assert_eq!(truncate_chars("ação", 10), ("ação", false));
    }
}
