//! Format sniffing and raw text extraction.
//!
//! Dispatch is by filename suffix only. Each [`FileFormat`] owns an
//! ordered list of [`TextExtractor`] strategies in an
//! [`ExtractorRegistry`]; they are tried in order and the first one that
//! returns non-empty text wins. The outcome is always an
//! [`ExtractionResult`]: failures become placeholder text, never errors.
//!
//! | Format | Primary | Fallback |
//! |--------|---------|----------|
//! | PDF | `pdf-extract` layout | `lopdf` page by page |
//! | DOCX | `quick-xml` run stream | `roxmltree` paragraphs + tables |
//! | TXT | encoding chain decode | |
//! | CSV | delimiter detection + summary | |
//! | XLSX | `zip` + `quick-xml` sheet summary | |

pub mod delimited;
pub mod docx;
pub mod pdf;
pub mod spreadsheet;
pub mod text;

use encoding_rs::Encoding;
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, info, warn};

use crate::config::{Config, LimitsConfig};
use crate::models::{ExtractionMethod, ExtractionResult, FailureKind, FileFormat, SourceFile};
use crate::traits::{ExtractorRegistry, TextExtractor};

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
pub(crate) const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extraction error for a single strategy. Never escapes [`extract`].
#[derive(Debug)]
pub enum ExtractError {
    Pdf(String),
    Ooxml(String),
    Csv(String),
    Decode(String),
    /// The strategy ran but found nothing to return.
    Empty(String),
    /// A parser panicked; the payload message is kept.
    Panicked(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Ooxml(e) => write!(f, "OOXML extraction failed: {}", e),
            ExtractError::Csv(e) => write!(f, "CSV parsing failed: {}", e),
            ExtractError::Decode(e) => write!(f, "text decoding failed: {}", e),
            ExtractError::Empty(e) => write!(f, "no text found: {}", e),
            ExtractError::Panicked(e) => write!(f, "extractor panicked: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Inputs every strategy receives besides the file bytes.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub limits: LimitsConfig,
    /// Fallback encodings tried after detection, in order.
    pub encodings: Vec<&'static Encoding>,
}

impl ExtractOptions {
    pub fn from_config(config: &Config) -> Self {
        let encodings = config
            .text
            .encodings
            .iter()
            .filter_map(|label| text::resolve_encoding(label))
            .collect();
        Self {
            limits: config.limits.clone(),
            encodings,
        }
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Extract raw text from `file`. Never panics and never returns an error.
pub fn extract(
    file: &SourceFile,
    registry: &ExtractorRegistry,
    options: &ExtractOptions,
) -> ExtractionResult {
    let Some(format) = file.format() else {
        info!(filename = %file.filename, "unsupported file format");
        return ExtractionResult::failed(FailureKind::UnsupportedFormat, "unsupported format");
    };
    run_strategies(format, registry.strategies(format), &file.bytes, options)
}

/// Apply `strategies` in order; stop at the first non-empty result.
pub fn run_strategies(
    format: FileFormat,
    strategies: &[Box<dyn TextExtractor>],
    bytes: &[u8],
    options: &ExtractOptions,
) -> ExtractionResult {
    if strategies.is_empty() {
        warn!(%format, "no extraction strategy registered");
        return ExtractionResult::failed(
            FailureKind::ExtractionFailure,
            format!("no extraction strategy registered for {}", format),
        );
    }

    let mut failures: Vec<String> = Vec::new();
    for (idx, strategy) in strategies.iter().enumerate() {
        match run_guarded(strategy.as_ref(), bytes, options) {
            Ok(text) if !text.trim().is_empty() => {
                let method = if idx == 0 {
                    ExtractionMethod::Primary
                } else {
                    ExtractionMethod::Fallback
                };
                debug!(%format, strategy = strategy.name(), chars = text.len(), "extraction succeeded");
                let mut diagnostic = format!("extracted with {}", strategy.name());
                if !failures.is_empty() {
                    diagnostic.push_str(" after ");
                    diagnostic.push_str(&failures.join("; "));
                }
                return ExtractionResult::extracted(text, method, diagnostic);
            }
            Ok(_) => {
                warn!(%format, strategy = strategy.name(), "extractor returned no text");
                failures.push(format!("{}: empty output", strategy.name()));
            }
            Err(e) => {
                warn!(%format, strategy = strategy.name(), error = %e, "extractor failed");
                failures.push(format!("{}: {}", strategy.name(), e));
            }
        }
    }

    ExtractionResult::failed(FailureKind::ExtractionFailure, failures.join("; "))
}

/// Run one strategy, converting a panic inside a parser into an error.
fn run_guarded(
    strategy: &dyn TextExtractor,
    bytes: &[u8],
    options: &ExtractOptions,
) -> Result<String, ExtractError> {
    catch_panic(|| strategy.extract(bytes, options))
}

pub(crate) fn catch_panic<T>(
    f: impl FnOnce() -> Result<T, ExtractError>,
) -> Result<T, ExtractError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(ExtractError::Panicked(msg))
        }
    }
}

pub(crate) fn open_zip(bytes: &[u8]) -> Result<zip::ZipArchive<std::io::Cursor<&[u8]>>, ExtractError> {
    zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| ExtractError::Ooxml(e.to_string()))
}

pub(crate) fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Ooxml(format!("{}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

/// Cut a table cell to `max_chars` characters, marking the cut with `...`.
pub(crate) fn truncate_cell(cell: &str, max_chars: usize) -> String {
    let cell = cell.trim();
    match cell.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &cell[..idx]),
        None => cell.to_string(),
    }
}

/// Render a row as `a | b | c` with every cell truncated.
pub(crate) fn format_row<'a>(cells: impl IntoIterator<Item = &'a str>, max_chars: usize) -> String {
    cells
        .into_iter()
        .map(|c| truncate_cell(c, max_chars))
        .collect::<Vec<_>>()
        .join(" | ")
}
