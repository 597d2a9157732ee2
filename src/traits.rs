//! Extension seams of the pipeline.
//!
//! Two collaborators can be swapped without touching the pipeline:
//!
//! - [`TextExtractor`]: one extraction strategy for one file format.
//!   Strategies are grouped per [`FileFormat`] in an [`ExtractorRegistry`]
//!   and tried in registration order.
//! - [`ContextCache`]: an optional read-through cache for finished
//!   pipeline outputs.
//!
//! # Usage
//!
//! ```rust
//! use lidia_context::models::FileFormat;
//! use lidia_context::traits::ExtractorRegistry;
//!
//! let registry = ExtractorRegistry::with_defaults();
//! assert_eq!(registry.strategies(FileFormat::Pdf).len(), 2);
//! // registry.register(FileFormat::Txt, Box::new(MyExtractor));
//! ```

use std::collections::BTreeMap;

use crate::extract::delimited::CsvSummaryExtractor;
use crate::extract::docx::{DocxStructureExtractor, DocxXmlExtractor};
use crate::extract::pdf::{PdfLayoutExtractor, PdfPageExtractor};
use crate::extract::spreadsheet::XlsxSummaryExtractor;
use crate::extract::text::PlainTextExtractor;
use crate::extract::{ExtractError, ExtractOptions};
use crate::models::FileFormat;
use crate::pipeline::PipelineOutput;

// ═══════════════════════════════════════════════════════════════════════
// Extraction strategies
// ═══════════════════════════════════════════════════════════════════════

/// One way of turning the bytes of a file into text.
///
/// Implementations must bound their own work by the caps in
/// [`ExtractOptions::limits`] and return an error rather than partial
/// garbage when the file cannot be read at all. Panics are caught by the
/// caller, but an implementation should not rely on that.
///
/// # Example
///
/// ```rust
/// use lidia_context::extract::{ExtractError, ExtractOptions};
/// use lidia_context::traits::TextExtractor;
///
/// struct Upper;
///
/// impl TextExtractor for Upper {
///     fn name(&self) -> &str { "upper" }
///
///     fn extract(&self, bytes: &[u8], _options: &ExtractOptions) -> Result<String, ExtractError> {
///         Ok(String::from_utf8_lossy(bytes).to_uppercase())
///     }
/// }
/// ```
pub trait TextExtractor: Send + Sync {
    /// Short identifier recorded in the extraction diagnostic.
    fn name(&self) -> &str;

    /// Extract text from `bytes`. An empty `Ok` counts as a failure.
    fn extract(&self, bytes: &[u8], options: &ExtractOptions) -> Result<String, ExtractError>;
}

/// Ordered extraction strategies per file format.
#[derive(Default)]
pub struct ExtractorRegistry {
    strategies: BTreeMap<FileFormat, Vec<Box<dyn TextExtractor>>>,
}

impl ExtractorRegistry {
    /// A registry with no strategies.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in strategies for every supported format.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(FileFormat::Pdf, Box::new(PdfLayoutExtractor));
        registry.register(FileFormat::Pdf, Box::new(PdfPageExtractor));
        registry.register(FileFormat::Docx, Box::new(DocxXmlExtractor));
        registry.register(FileFormat::Docx, Box::new(DocxStructureExtractor));
        registry.register(FileFormat::Txt, Box::new(PlainTextExtractor));
        registry.register(FileFormat::Csv, Box::new(CsvSummaryExtractor));
        registry.register(FileFormat::Xlsx, Box::new(XlsxSummaryExtractor));
        registry
    }

    /// Append a strategy after the ones already registered for `format`.
    pub fn register(&mut self, format: FileFormat, strategy: Box<dyn TextExtractor>) {
        self.strategies.entry(format).or_default().push(strategy);
    }

    /// Replace every strategy registered for `format`.
    pub fn replace(&mut self, format: FileFormat, strategies: Vec<Box<dyn TextExtractor>>) {
        self.strategies.insert(format, strategies);
    }

    /// Strategies for `format` in the order they will be tried.
    pub fn strategies(&self, format: FileFormat) -> &[Box<dyn TextExtractor>] {
        self.strategies
            .get(&format)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Names of the strategies for `format`, in order.
    pub fn strategy_names(&self, format: FileFormat) -> Vec<&str> {
        self.strategies(format).iter().map(|s| s.name()).collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Cache
// ═══════════════════════════════════════════════════════════════════════

/// Read-through cache for finished pipeline outputs.
///
/// Keys are opaque content hashes computed by the pipeline. The
/// implementation owns its eviction policy; `put` may silently drop an
/// older entry to make room.
pub trait ContextCache: Send + Sync {
    fn get(&self, key: &str) -> Option<PipelineOutput>;

    fn put(&self, key: String, value: PipelineOutput);
}
