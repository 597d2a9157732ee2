//! TOML configuration.
//!
//! Every key is optional; an empty file yields [`Config::default`].
//!
//! ```toml
//! [chunking]
//! max_chunk_words = 1000
//! chunk_overlap_words = 100
//!
//! [context]
//! max_context_length = 4000
//! min_content_length = 10
//! order = "relevance"       # or "document"
//!
//! [limits]
//! max_pdf_pages = 50
//! max_xlsx_sheets = 5
//! max_xlsx_rows_per_sheet = 50
//! max_csv_sample_rows = 20
//! max_cell_chars = 50
//!
//! [text]
//! encodings = ["utf-8", "latin-1", "cp1252", "iso-8859-1"]
//!
//! [cache]
//! enabled = true
//! capacity = 64
//! ```

use anyhow::{Context, Result};
use lidia_context_core::reduce::{ReduceParams, SelectionOrder};
use lidia_context_core::score::ScoringPolicy;
use serde::Deserialize;
use std::path::Path;

use crate::extract::text::resolve_encoding;

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub text: TextConfig,
    #[serde(default)]
    pub scoring: ScoringPolicy,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chunk_words")]
    pub max_chunk_words: usize,
    #[serde(default = "default_chunk_overlap_words")]
    pub chunk_overlap_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_words: default_max_chunk_words(),
            chunk_overlap_words: default_chunk_overlap_words(),
        }
    }
}

fn default_max_chunk_words() -> usize {
    1000
}
fn default_chunk_overlap_words() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ContextConfig {
    #[serde(default = "default_max_context_length")]
    pub max_context_length: usize,
    #[serde(default = "default_min_content_length")]
    pub min_content_length: usize,
    #[serde(default)]
    pub order: SelectionOrder,
    #[serde(default = "default_section_label")]
    pub section_label: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_length: default_max_context_length(),
            min_content_length: default_min_content_length(),
            order: SelectionOrder::default(),
            section_label: default_section_label(),
        }
    }
}

fn default_max_context_length() -> usize {
    4000
}
fn default_min_content_length() -> usize {
    10
}
fn default_section_label() -> String {
    "Seção".to_string()
}

/// Resource caps applied while extracting. Exceeding a cap is not an
/// error; the retained subset is processed as usual.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LimitsConfig {
    #[serde(default = "default_max_pdf_pages")]
    pub max_pdf_pages: usize,
    #[serde(default = "default_max_xlsx_sheets")]
    pub max_xlsx_sheets: usize,
    #[serde(default = "default_max_xlsx_rows_per_sheet")]
    pub max_xlsx_rows_per_sheet: usize,
    #[serde(default = "default_max_csv_sample_rows")]
    pub max_csv_sample_rows: usize,
    #[serde(default = "default_max_cell_chars")]
    pub max_cell_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_pdf_pages: default_max_pdf_pages(),
            max_xlsx_sheets: default_max_xlsx_sheets(),
            max_xlsx_rows_per_sheet: default_max_xlsx_rows_per_sheet(),
            max_csv_sample_rows: default_max_csv_sample_rows(),
            max_cell_chars: default_max_cell_chars(),
        }
    }
}

fn default_max_pdf_pages() -> usize {
    50
}
fn default_max_xlsx_sheets() -> usize {
    5
}
fn default_max_xlsx_rows_per_sheet() -> usize {
    50
}
fn default_max_csv_sample_rows() -> usize {
    20
}
fn default_max_cell_chars() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TextConfig {
    /// Encoding labels tried, in order, after the detected encoding.
    #[serde(default = "default_encodings")]
    pub encodings: Vec<String>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            encodings: default_encodings(),
        }
    }
}

fn default_encodings() -> Vec<String> {
    ["utf-8", "latin-1", "cp1252", "iso-8859-1"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_capacity() -> usize {
    64
}

impl Config {
    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Config> {
        let config: Config =
            toml::from_str(content).with_context(|| "Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Validate chunking
        if self.chunking.max_chunk_words == 0 {
            anyhow::bail!("chunking.max_chunk_words must be > 0");
        }
        if self.chunking.chunk_overlap_words >= self.chunking.max_chunk_words {
            anyhow::bail!(
                "chunking.chunk_overlap_words ({}) must be < chunking.max_chunk_words ({})",
                self.chunking.chunk_overlap_words,
                self.chunking.max_chunk_words
            );
        }

        // Validate context
        if self.context.max_context_length == 0 {
            anyhow::bail!("context.max_context_length must be > 0");
        }

        // Validate limits
        if self.limits.max_pdf_pages == 0 {
            anyhow::bail!("limits.max_pdf_pages must be > 0");
        }
        if self.limits.max_xlsx_sheets == 0 || self.limits.max_xlsx_rows_per_sheet == 0 {
            anyhow::bail!("limits.max_xlsx_sheets and limits.max_xlsx_rows_per_sheet must be > 0");
        }
        if self.limits.max_cell_chars == 0 {
            anyhow::bail!("limits.max_cell_chars must be > 0");
        }

        // Validate encodings
        for label in &self.text.encodings {
            if resolve_encoding(label).is_none() {
                anyhow::bail!("Unknown text encoding: '{}'", label);
            }
        }

        if self.cache.enabled && self.cache.capacity == 0 {
            anyhow::bail!("cache.capacity must be > 0 when the cache is enabled");
        }

        Ok(())
    }

    /// Reduction parameters derived from `[chunking]` and `[context]`.
    pub fn reduce_params(&self) -> ReduceParams {
        ReduceParams {
            max_length: self.context.max_context_length,
            max_chunk_words: self.chunking.max_chunk_words,
            chunk_overlap_words: self.chunking.chunk_overlap_words,
            order: self.context.order,
            section_label: self.context.section_label.clone(),
        }
    }
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    Config::from_toml_str(&content)
}
