//! # LIDIA Context Core
//!
//! Pure text logic for the LIDIA document pipeline: data models,
//! normalization, sentence chunking, relevance scoring, and bounded
//! context reduction.
//!
//! This crate performs no file or network I/O and holds no global state.
//! Every function takes its inputs explicitly, so callers may run it from
//! any number of threads without synchronization.
//!
//! ```rust
//! use lidia_context_core::normalize::normalize;
//! use lidia_context_core::reduce::{reduce, ReduceParams};
//! use lidia_context_core::score::ScoringPolicy;
//!
//! let text = normalize("Introdução.\n\n\n\nO  objetivo   do estudo.");
//! let ctx = reduce(&text, &ReduceParams::default(), &ScoringPolicy::default());
//! assert_eq!(ctx.text, "Introdução.\n\nO objetivo do estudo.");
//! ```

pub mod chunk;
pub mod models;
pub mod normalize;
pub mod reduce;
pub mod score;
