//! DOCX extraction strategies.
//!
//! Both strategies read `word/document.xml` from the OOXML ZIP container.
//! [`DocxXmlExtractor`] streams every text run in document order with
//! `quick-xml`; [`DocxStructureExtractor`] parses the tree with
//! `roxmltree` and walks paragraphs and tables explicitly, which survives
//! documents whose run markup confuses the streaming pass.

use quick_xml::events::Event;

use super::{open_zip, read_zip_entry_bounded, ExtractError, ExtractOptions, MAX_XML_ENTRY_BYTES};
use crate::traits::TextExtractor;

const DOCUMENT_XML: &str = "word/document.xml";

/// Whole-document text stream over `w:t` runs.
pub struct DocxXmlExtractor;

impl TextExtractor for DocxXmlExtractor {
    fn name(&self) -> &str {
        "docx-xml-stream"
    }

    fn extract(&self, bytes: &[u8], _options: &ExtractOptions) -> Result<String, ExtractError> {
        let xml = read_document_xml(bytes)?;
        stream_document_text(&xml)
    }
}

/// Paragraph-and-table walker.
pub struct DocxStructureExtractor;

impl TextExtractor for DocxStructureExtractor {
    fn name(&self) -> &str {
        "docx-structure"
    }

    fn extract(&self, bytes: &[u8], _options: &ExtractOptions) -> Result<String, ExtractError> {
        let xml = read_document_xml(bytes)?;
        let xml = std::str::from_utf8(&xml).map_err(|e| ExtractError::Ooxml(e.to_string()))?;
        walk_document(xml)
    }
}

fn read_document_xml(bytes: &[u8]) -> Result<Vec<u8>, ExtractError> {
    let mut archive = open_zip(bytes)?;
    read_zip_entry_bounded(&mut archive, DOCUMENT_XML, MAX_XML_ENTRY_BYTES)
}

/// Text of every run, with tabs and breaks kept and one line per paragraph.
pub fn stream_document_text(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut in_run = false;
    let mut in_text = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"r" => in_run = true,
                b"t" if in_run => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" if in_run => out.push('\t'),
                b"br" | b"cr" if in_run => out.push('\n'),
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                let text = te.unescape().map_err(|e| ExtractError::Ooxml(e.to_string()))?;
                out.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => in_run = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

/// Walk the body in document order: paragraphs become lines, tables
/// become one `cell | cell` line per row.
pub fn walk_document(xml: &str) -> Result<String, ExtractError> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let body = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "body")
        .ok_or_else(|| ExtractError::Ooxml("document has no body".to_string()))?;

    let mut lines = Vec::new();
    walk_blocks(body, &mut lines);
    Ok(lines.join("\n"))
}

fn walk_blocks(node: roxmltree::Node<'_, '_>, lines: &mut Vec<String>) {
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "p" => {
                let text = paragraph_text(child);
                if !text.trim().is_empty() {
                    lines.push(text);
                }
            }
            "tbl" => {
                for row in child
                    .children()
                    .filter(|n| n.is_element() && n.tag_name().name() == "tr")
                {
                    let cells: Vec<String> = row
                        .children()
                        .filter(|n| n.is_element() && n.tag_name().name() == "tc")
                        .map(cell_text)
                        .collect();
                    if cells.iter().any(|c| !c.is_empty()) {
                        lines.push(cells.join(" | "));
                    }
                }
            }
            // Content controls wrap ordinary blocks.
            "sdt" | "sdtContent" => walk_blocks(child, lines),
            _ => {}
        }
    }
}

fn paragraph_text(paragraph: roxmltree::Node<'_, '_>) -> String {
    let mut out = String::new();
    for node in paragraph.descendants().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "t" => out.push_str(node.text().unwrap_or_default()),
            "tab" if node.parent().is_some_and(|p| p.tag_name().name() == "r") => out.push('\t'),
            "br" => out.push('\n'),
            _ => {}
        }
    }
    out
}

fn cell_text(cell: roxmltree::Node<'_, '_>) -> String {
    cell.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "p")
        .map(paragraph_text)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
