//! Data models shared by every pipeline stage.
//!
//! These types describe what flows between extraction, normalization and
//! reduction. They carry no I/O and no parser state.

use serde::Serialize;

/// Placeholder returned when the filename suffix is not a supported format.
pub const PLACEHOLDER_UNSUPPORTED: &str =
    "[Formato de arquivo não suportado. Envie um arquivo PDF, DOCX, TXT, CSV ou XLSX.]";

/// Placeholder returned when every extraction strategy failed.
pub const PLACEHOLDER_EXTRACTION_FAILED: &str =
    "[Não foi possível extrair o texto do arquivo. O arquivo pode estar protegido ou corrompido.]";

/// Placeholder returned when extraction worked but produced almost no text.
pub const PLACEHOLDER_NO_CONTENT: &str =
    "[O arquivo não contém conteúdo textual significativo.]";

/// Which strategy produced an [`ExtractionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// The first strategy registered for the format succeeded.
    Primary,
    /// A later strategy succeeded after the primary one failed.
    Fallback,
    /// No strategy produced text.
    Failed,
}

/// Why a pipeline run did not produce document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    UnsupportedFormat,
    ExtractionFailure,
    InsufficientContent,
}

impl FailureKind {
    /// The user-facing placeholder for this failure.
    pub fn placeholder(self) -> &'static str {
        match self {
            FailureKind::UnsupportedFormat => PLACEHOLDER_UNSUPPORTED,
            FailureKind::ExtractionFailure => PLACEHOLDER_EXTRACTION_FAILED,
            FailureKind::InsufficientContent => PLACEHOLDER_NO_CONTENT,
        }
    }
}

/// Raw text produced by the extractor stage.
///
/// `raw_text` is empty only when `method` is [`ExtractionMethod::Failed`];
/// failed results carry the placeholder for their [`FailureKind`] instead
/// of document text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub raw_text: String,
    pub method: ExtractionMethod,
    pub diagnostic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl ExtractionResult {
    /// A successful extraction.
    pub fn extracted(raw_text: String, method: ExtractionMethod, diagnostic: String) -> Self {
        Self {
            raw_text,
            method,
            diagnostic,
            failure: None,
        }
    }

    /// A failed extraction carrying the placeholder text for `kind`.
    pub fn failed(kind: FailureKind, diagnostic: impl Into<String>) -> Self {
        Self {
            raw_text: kind.placeholder().to_string(),
            method: ExtractionMethod::Failed,
            diagnostic: diagnostic.into(),
            failure: Some(kind),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.method == ExtractionMethod::Failed
    }
}

/// A contiguous, overlap-linked segment of normalized text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    pub text: String,
    /// Position in the original chunk sequence, starting at 0.
    pub ordinal: usize,
    /// Relevance score; only meaningful during selection.
    pub relevance_score: i64,
    pub word_count: usize,
}

/// The bounded context handed to the prompt assembler.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Context {
    pub text: String,
    /// Ordinals of the chunks that made it into `text`, in output order.
    pub selected: Vec<usize>,
    pub total_chunks: usize,
    /// True if any chunk text was cut to fit the length cap.
    pub truncated: bool,
}

impl Context {
    /// Character count of the context text.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
