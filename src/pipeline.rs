//! End-to-end context building.
//!
//! A [`ContextPipeline`] takes an uploaded file through every stage:
//!
//! ```text
//! SourceFile ─▶ extract ─▶ normalize ─▶ content check ─▶ reduce ─▶ Context
//!                  │                         │
//!                  └── placeholder ◀─────────┘ (on failure)
//! ```
//!
//! Every stage is infallible from the caller's point of view: a file that
//! cannot be read yields a placeholder context, never an error. An optional
//! [`ContextCache`] short-circuits files that were already processed.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info};

use lidia_context_core::normalize::{has_significant_content, normalize};
use lidia_context_core::reduce::reduce;

use crate::cache::MemoryCache;
use crate::config::Config;
use crate::extract::{extract, ExtractOptions};
use crate::models::{Context, ExtractionMethod, ExtractionResult, FailureKind, SourceFile};
use crate::traits::{ContextCache, ExtractorRegistry};

/// How a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Document text was extracted and reduced.
    Extracted,
    /// The context is the placeholder for this failure.
    Failed(FailureKind),
}

/// Extraction details kept alongside the context, without the raw text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionSummary {
    pub method: ExtractionMethod,
    pub diagnostic: String,
    /// Characters of raw text before normalization.
    pub raw_chars: usize,
}

impl From<&ExtractionResult> for ExtractionSummary {
    fn from(result: &ExtractionResult) -> Self {
        Self {
            method: result.method,
            diagnostic: result.diagnostic.clone(),
            raw_chars: result.raw_text.chars().count(),
        }
    }
}

/// Result of [`ContextPipeline::build`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub context: Context,
    pub outcome: Outcome,
    pub extraction: ExtractionSummary,
    /// True if this output was served from the cache.
    pub from_cache: bool,
}

impl PipelineOutput {
    fn failed(kind: FailureKind, extraction: ExtractionSummary) -> Self {
        Self {
            context: Context {
                text: kind.placeholder().to_string(),
                selected: Vec::new(),
                total_chunks: 0,
                truncated: false,
            },
            outcome: Outcome::Failed(kind),
            extraction,
            from_cache: false,
        }
    }
}

/// Extraction, normalization and reduction bound to one configuration.
///
/// The pipeline holds no mutable state of its own and can be shared
/// across threads; the cache, if any, does its own locking.
pub struct ContextPipeline {
    config: Config,
    options: ExtractOptions,
    registry: ExtractorRegistry,
    cache: Option<Arc<dyn ContextCache>>,
}

impl ContextPipeline {
    /// A pipeline with the built-in extractors. When `[cache].enabled` is
    /// set, a [`MemoryCache`] of the configured capacity is attached.
    pub fn new(config: Config) -> Self {
        let cache: Option<Arc<dyn ContextCache>> = if config.cache.enabled {
            Some(Arc::new(MemoryCache::new(config.cache.capacity)))
        } else {
            None
        };
        let mut pipeline = Self::with_registry(config, ExtractorRegistry::with_defaults());
        pipeline.cache = cache;
        pipeline
    }

    /// A pipeline with caller-supplied extraction strategies and no cache.
    pub fn with_registry(config: Config, registry: ExtractorRegistry) -> Self {
        let options = ExtractOptions::from_config(&config);
        Self {
            config,
            options,
            registry,
            cache: None,
        }
    }

    /// Attach a cache, replacing any configured one.
    pub fn with_cache(mut self, cache: Arc<dyn ContextCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extract raw text only, without normalization or reduction.
    pub fn extract(&self, file: &SourceFile) -> ExtractionResult {
        extract(file, &self.registry, &self.options)
    }

    /// Build the bounded context for `file`.
    pub fn build(&self, file: &SourceFile) -> PipelineOutput {
        let key = self.cache.as_ref().map(|_| cache_key(file));
        if let (Some(cache), Some(key)) = (self.cache.as_ref(), key.as_deref()) {
            if let Some(mut hit) = cache.get(key) {
                debug!(filename = %file.filename, "context cache hit");
                hit.from_cache = true;
                return hit;
            }
        }

        let output = self.run(file);

        if let (Some(cache), Some(key)) = (self.cache.as_ref(), key) {
            cache.put(key, output.clone());
        }
        output
    }

    fn run(&self, file: &SourceFile) -> PipelineOutput {
        let extraction = self.extract(file);
        let summary = ExtractionSummary::from(&extraction);
        if let Some(kind) = extraction.failure {
            info!(filename = %file.filename, failure = ?kind, diagnostic = %extraction.diagnostic, "extraction failed");
            return PipelineOutput::failed(kind, summary);
        }

        let text = normalize(&extraction.raw_text);
        if !has_significant_content(&text, self.config.context.min_content_length) {
            info!(filename = %file.filename, chars = text.chars().count(), "insufficient content");
            return PipelineOutput::failed(FailureKind::InsufficientContent, summary);
        }

        let context = reduce(&text, &self.config.reduce_params(), &self.config.scoring);
        info!(
            filename = %file.filename,
            method = ?extraction.method,
            chunks = context.total_chunks,
            selected = context.selected.len(),
            chars = context.len(),
            "context built"
        );
        PipelineOutput {
            context,
            outcome: Outcome::Extracted,
            extraction: summary,
            from_cache: false,
        }
    }
}

/// One-shot helper: bytes and filename in, context text out.
pub fn build_context(bytes: &[u8], filename: &str, config: &Config) -> String {
    let pipeline = ContextPipeline::new(config.clone());
    pipeline
        .build(&SourceFile::new(filename, bytes))
        .context
        .text
}

/// Cache key for `file`: hex SHA-256 over the filename, a NUL separator,
/// and the file bytes. The filename is included because it selects the
/// extractor.
pub fn cache_key(file: &SourceFile) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file.filename.as_bytes());
    hasher.update([0u8]);
    hasher.update(&file.bytes);
    hex::encode(hasher.finalize())
}
