//! Input types for the extraction pipeline.
//!
//! Text-level types (`ExtractionResult`, `Chunk`, `Context`) live in
//! `lidia_context_core::models` and are re-exported here.

pub use lidia_context_core::models::{
    Chunk, Context, ExtractionMethod, ExtractionResult, FailureKind, PLACEHOLDER_EXTRACTION_FAILED,
    PLACEHOLDER_NO_CONTENT, PLACEHOLDER_UNSUPPORTED,
};

/// An uploaded file: its bytes and the filename the client declared.
///
/// Created at the upload boundary and consumed once by the pipeline.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// The format implied by the filename suffix, if supported.
    pub fn format(&self) -> Option<FileFormat> {
        FileFormat::from_filename(&self.filename)
    }
}

/// The closed set of supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileFormat {
    Pdf,
    Docx,
    Txt,
    Csv,
    Xlsx,
}

impl FileFormat {
    pub const ALL: [FileFormat; 5] = [
        FileFormat::Pdf,
        FileFormat::Docx,
        FileFormat::Txt,
        FileFormat::Csv,
        FileFormat::Xlsx,
    ];

    /// Detect the format from a filename suffix, case-insensitively.
    ///
    /// Only the final suffix counts: `relatorio.pdf.exe` is not a PDF,
    /// while a name that is just `.pdf` is.
    pub fn from_filename(filename: &str) -> Option<FileFormat> {
        let name = filename.trim().to_lowercase();
        FileFormat::ALL
            .into_iter()
            .find(|format| name.ends_with(&format!(".{}", format.extension())))
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Pdf => "pdf",
            FileFormat::Docx => "docx",
            FileFormat::Txt => "txt",
            FileFormat::Csv => "csv",
            FileFormat::Xlsx => "xlsx",
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
