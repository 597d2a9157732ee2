//! Heuristic relevance scoring for chunks.
//!
//! The score favors chunks that look information-dense: technical
//! vocabulary, list structure, and quantitative data. The weights are
//! policy, not truth, so every constant lives in [`ScoringPolicy`] and can
//! be overridden from configuration.
//!
//! | Signal | Default |
//! |--------|---------|
//! | each occurrence of a technical term | +10 |
//! | any structural marker (`1.`, `a)`, `•`, `-`, `II.`) | +8 |
//! | any number pattern (`95%`, `3.14`, `1/2`) | +12 |
//! | fewer than 30 words | −10 |

use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

use crate::models::Chunk;

fn structure_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|\s)(?:\d+\.|[a-z]\)|•|-|–|[IVXLC]+\.)(?:\s|$)").expect("valid regex")
    })
}

fn numeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+[%,$]|\d+\.\d+|\d+/\d+").expect("valid regex"))
}

/// Weights and vocabulary for [`score_chunk`].
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Technical vocabulary, matched case-insensitively as substrings.
    pub terms: Vec<String>,
    pub term_weight: i64,
    pub structure_bonus: i64,
    pub numeric_bonus: i64,
    pub short_chunk_penalty: i64,
    /// Chunks with fewer words than this are penalized.
    pub short_chunk_words: usize,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            terms: [
                "resultado",
                "conclusão",
                "objetivo",
                "método",
                "metodologia",
                "análise",
                "dados",
                "tabela",
                "resumo",
                "introdução",
            ]
            .iter()
            .map(|t| t.to_string())
            .collect(),
            term_weight: 10,
            structure_bonus: 8,
            numeric_bonus: 12,
            short_chunk_penalty: 10,
            short_chunk_words: 30,
        }
    }
}

/// Score a single chunk under `policy`.
pub fn score_chunk(chunk: &Chunk, policy: &ScoringPolicy) -> i64 {
    let lowered = chunk.text.to_lowercase();
    let mut score = 0i64;

    for term in &policy.terms {
        let term = term.to_lowercase();
        if term.is_empty() {
            continue;
        }
        score += policy.term_weight * lowered.matches(term.as_str()).count() as i64;
    }

    if structure_re().is_match(&chunk.text) {
        score += policy.structure_bonus;
    }

    if numeric_re().is_match(&chunk.text) {
        score += policy.numeric_bonus;
    }

    let words = chunk.text.split_whitespace().count();
    if words < policy.short_chunk_words {
        score -= policy.short_chunk_penalty;
    }

    score
}

/// Score every chunk in place.
pub fn score_chunks(chunks: &mut [Chunk], policy: &ScoringPolicy) {
    for chunk in chunks.iter_mut() {
        chunk.relevance_score = score_chunk(chunk, policy);
    }
}
