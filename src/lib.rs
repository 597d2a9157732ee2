//! # LIDIA Context
//!
//! Document ingestion for the LIDIA assistant: turns an uploaded PDF,
//! DOCX, TXT, CSV or XLSX file into a bounded plain-text context that can
//! be placed in an LLM prompt.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌────────────┐   ┌────────────┐   ┌──────────┐
//! │  Extractor  │──▶│ Normalizer │──▶│  Reducer   │──▶│ Context  │
//! │ PDF/DOCX/.. │   │            │   │ chunk+rank │   │ ≤ N chars│
//! └─────────────┘   └────────────┘   └────────────┘   └──────────┘
//! ```
//!
//! Extraction lives in this crate; normalization, chunking, scoring and
//! reduction are pure functions in [`lidia_context_core`].
//!
//! ## Quick Start
//!
//! ```rust
//! use lidia_context::config::Config;
//! use lidia_context::pipeline::build_context;
//!
//! let context = build_context(b"Resumo: 42% de ganho.", "nota.txt", &Config::default());
//! assert_eq!(context, "Resumo: 42% de ganho.");
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Input types and re-exported core models |
//! | [`extract`] | Per-format extraction strategies |
//! | [`traits`] | Extractor and cache extension points |
//! | [`pipeline`] | End-to-end context building |
//! | [`cache`] | In-memory LRU cache |

pub mod cache;
pub mod config;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod traits;

pub use lidia_context_core;
