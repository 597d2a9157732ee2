//! PDF extraction strategies.
//!
//! The layout extractor (`pdf-extract`) reads text in visual order and
//! handles most fonts, but it fails on the whole document at once. The
//! page extractor (`lopdf`) is less faithful but isolates failures to the
//! page that caused them.
//!
//! Both honor `max_pdf_pages` before doing any text work: the layout
//! extractor receives a copy of the document trimmed to the cap, and the
//! page extractor never visits pages past it.
//!
//! A page that yields no text is checked with `lopdf`: if its content
//! stream is missing or cannot be decoded, the page is reported as failed
//! and replaced by [`failed_page_marker`] instead of being skipped.

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use std::borrow::Cow;
use tracing::debug;

use super::{catch_panic, ExtractError, ExtractOptions};
use crate::traits::TextExtractor;

/// Full-fidelity layout extraction via `pdf-extract`.
pub struct PdfLayoutExtractor;

impl TextExtractor for PdfLayoutExtractor {
    fn name(&self) -> &str {
        "pdf-extract-layout"
    }

    fn extract(&self, bytes: &[u8], options: &ExtractOptions) -> Result<String, ExtractError> {
        let max_pages = options.limits.max_pdf_pages;
        let mut doc = load(bytes)?;
        let capped = cap_pages(&mut doc, bytes, max_pages)?;
        let texts = pdf_extract::extract_text_from_mem_by_pages(&capped)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;

        let pages = doc.get_pages();
        let results = pages.iter().take(max_pages).enumerate().map(|(idx, (&number, &id))| {
            let text = texts.get(idx).cloned().unwrap_or_default();
            (number, verify_page_text(&doc, id, text))
        });
        let (text, readable) = assemble_pages(results);
        if readable == 0 {
            return Err(ExtractError::Empty("no readable pages".to_string()));
        }
        Ok(text)
    }
}

/// Page-by-page extraction via `lopdf`; unreadable pages become markers.
pub struct PdfPageExtractor;

impl TextExtractor for PdfPageExtractor {
    fn name(&self) -> &str {
        "lopdf-pages"
    }

    fn extract(&self, bytes: &[u8], options: &ExtractOptions) -> Result<String, ExtractError> {
        let doc = load(bytes)?;
        let pages = doc.get_pages();
        let max_pages = options.limits.max_pdf_pages;
        if pages.len() > max_pages {
            debug!(pages = pages.len(), max_pages, "PDF page cap reached");
        }

        let results = pages.iter().take(max_pages).map(|(&number, &id)| {
            let result = catch_panic(|| {
                doc.extract_text(&[number])
                    .map_err(|e| ExtractError::Pdf(e.to_string()))
            })
            .and_then(|text| verify_page_text(&doc, id, text));
            (number, result)
        });
        let (text, readable) = assemble_pages(results);
        if readable == 0 {
            return Err(ExtractError::Empty("no readable pages".to_string()));
        }
        Ok(text)
    }
}

fn load(bytes: &[u8]) -> Result<Document, ExtractError> {
    catch_panic(|| Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string())))
}

/// Marker left in place of a page whose text could not be read.
pub fn failed_page_marker(page_number: u32) -> String {
    format!("[Página {}: texto não pôde ser extraído]", page_number)
}

/// Join per-page results. Failed pages contribute a marker, empty pages
/// contribute nothing. Returns the text and the number of pages with text.
pub fn assemble_pages(
    pages: impl Iterator<Item = (u32, Result<String, ExtractError>)>,
) -> (String, usize) {
    let mut segments = Vec::new();
    let mut readable = 0usize;
    for (number, result) in pages {
        match result {
            Ok(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    readable += 1;
                    segments.push(trimmed.to_string());
                }
            }
            Err(e) => {
                debug!(page = number, error = %e, "PDF page unreadable");
                segments.push(failed_page_marker(number));
            }
        }
    }
    (segments.join("\n\n"), readable)
}

/// Accept `text` for a page, unless it is blank and the page content is broken.
fn verify_page_text(doc: &Document, page_id: ObjectId, text: String) -> Result<String, ExtractError> {
    if !text.trim().is_empty() {
        return Ok(text);
    }
    catch_panic(|| check_page_content(doc, page_id)).map(|_| text)
}

/// Fail if the page references content that is missing or does not decode.
/// A page with no `/Contents` at all is a legitimately blank page.
pub fn check_page_content(doc: &Document, page_id: ObjectId) -> Result<(), ExtractError> {
    let stream_ids = doc.get_page_contents(page_id);
    let mut data = Vec::new();
    for id in stream_ids {
        let stream = doc
            .get_object(id)
            .and_then(Object::as_stream)
            .map_err(|e| ExtractError::Pdf(format!("content stream {:?}: {}", id, e)))?;
        match stream.decompressed_content() {
            Ok(bytes) => data.extend_from_slice(&bytes),
            Err(_) => data.extend_from_slice(&stream.content),
        }
    }

    if data.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(());
    }
    let content = Content::decode(&data).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    if content.operations.is_empty() {
        return Err(ExtractError::Pdf("invalid content stream".to_string()));
    }
    Ok(())
}

/// Trim `doc` to its first `max_pages` pages. Returns `bytes` unchanged if
/// the document is within the cap, otherwise the re-serialized document.
fn cap_pages<'a>(
    doc: &mut Document,
    bytes: &'a [u8],
    max_pages: usize,
) -> Result<Cow<'a, [u8]>, ExtractError> {
    let pages = doc.get_pages();
    if pages.len() <= max_pages {
        return Ok(Cow::Borrowed(bytes));
    }

    debug!(pages = pages.len(), max_pages, "trimming PDF to page cap");
    let beyond: Vec<u32> = pages.keys().copied().skip(max_pages).collect();
    doc.delete_pages(&beyond);
    doc.prune_objects();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(Cow::Owned(out))
}
