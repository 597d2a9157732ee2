//! XLSX summarization.
//!
//! Reads the OOXML workbook directly with `zip` + `quick-xml`: sheet names
//! come from `xl/workbook.xml` and its relationships, cell strings from
//! `xl/sharedStrings.xml`. Each retained sheet is rendered like a CSV
//! summary. Sheets past `max_xlsx_sheets` are never opened and row parsing
//! stops at `max_xlsx_rows_per_sheet`.

use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::io::Cursor;
use tracing::debug;

use super::{
    format_row, open_zip, read_zip_entry_bounded, ExtractError, ExtractOptions,
    MAX_XML_ENTRY_BYTES,
};
use crate::traits::TextExtractor;

/// Widest row rendered; columns past this are ignored.
const MAX_COLUMNS: usize = 64;

type Archive<'a> = zip::ZipArchive<Cursor<&'a [u8]>>;

/// `.xlsx` extraction: per-sheet labeled summaries.
pub struct XlsxSummaryExtractor;

impl TextExtractor for XlsxSummaryExtractor {
    fn name(&self) -> &str {
        "xlsx-summary"
    }

    fn extract(&self, bytes: &[u8], options: &ExtractOptions) -> Result<String, ExtractError> {
        let limits = &options.limits;
        let mut archive = open_zip(bytes)?;
        let shared_strings = read_shared_strings(&mut archive)?;
        let sheets = list_sheets(&mut archive)?;
        if sheets.len() > limits.max_xlsx_sheets {
            debug!(sheets = sheets.len(), max = limits.max_xlsx_sheets, "XLSX sheet cap reached");
        }

        let mut summaries = Vec::new();
        for sheet in sheets.into_iter().take(limits.max_xlsx_sheets) {
            let xml = read_zip_entry_bounded(&mut archive, &sheet.path, MAX_XML_ENTRY_BYTES)?;
            let data = read_sheet_rows(&xml, &shared_strings, limits.max_xlsx_rows_per_sheet)?;
            summaries.push(summarize_sheet(&sheet.name, &data, limits.max_cell_chars));
        }
        Ok(summaries.join("\n"))
    }
}

/// A worksheet entry in the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRef {
    pub name: String,
    pub path: String,
}

/// Rows read from one sheet, with empty rows already dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetData {
    pub rows: Vec<Vec<String>>,
    /// Data rows (header excluded) of the sheet's declared dimension, if present.
    pub declared_rows: Option<usize>,
}

fn read_shared_strings(archive: &mut Archive<'_>) -> Result<Vec<String>, ExtractError> {
    if archive.index_for_name("xl/sharedStrings.xml").is_none() {
        return Ok(Vec::new());
    }
    let xml = read_zip_entry_bounded(archive, "xl/sharedStrings.xml", MAX_XML_ENTRY_BYTES)?;
    parse_shared_strings(&xml)
}

/// Shared string table; rich-text runs inside one `si` are concatenated.
pub fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>, ExtractError> {
    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_t = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_t = current.is_some(),
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Ok(Event::Text(te)) if in_t => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&te.unescape().map_err(|e| ExtractError::Ooxml(e.to_string()))?);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_t = false,
                b"si" => {
                    if let Some(s) = current.take() {
                        strings.push(s);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Sheets in workbook order. Falls back to `sheetN.xml` order when the
/// workbook part or its relationships are missing.
fn list_sheets(archive: &mut Archive<'_>) -> Result<Vec<SheetRef>, ExtractError> {
    let has_workbook = archive.index_for_name("xl/workbook.xml").is_some()
        && archive.index_for_name("xl/_rels/workbook.xml.rels").is_some();
    if has_workbook {
        let workbook = read_zip_entry_bounded(archive, "xl/workbook.xml", MAX_XML_ENTRY_BYTES)?;
        let rels =
            read_zip_entry_bounded(archive, "xl/_rels/workbook.xml.rels", MAX_XML_ENTRY_BYTES)?;
        let targets = parse_relationships(&rels)?;
        let sheets: Vec<SheetRef> = parse_workbook_sheets(&workbook)?
            .into_iter()
            .filter_map(|(name, rel_id)| {
                targets.get(&rel_id).map(|target| SheetRef {
                    name,
                    path: resolve_target(target),
                })
            })
            .filter(|sheet| archive.index_for_name(&sheet.path).is_some())
            .collect();
        if !sheets.is_empty() {
            return Ok(sheets);
        }
    }
    Ok(list_worksheet_files(archive))
}

fn list_worksheet_files(archive: &Archive<'_>) -> Vec<SheetRef> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| sheet_number(name));
    names
        .into_iter()
        .map(|path| SheetRef {
            name: format!("Planilha {}", sheet_number(&path)),
            path,
        })
        .collect()
}

fn sheet_number(path: &str) -> u32 {
    path.trim_start_matches("xl/worksheets/sheet")
        .trim_end_matches(".xml")
        .parse::<u32>()
        .unwrap_or(u32::MAX)
}

fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

fn attr_value(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// `(sheet name, relationship id)` pairs from `xl/workbook.xml`.
fn parse_workbook_sheets(xml: &[u8]) -> Result<Vec<(String, String)>, ExtractError> {
    let mut sheets = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"sheet" => {
                if let (Some(name), Some(id)) = (attr_value(&e, b"name"), attr_value(&e, b"id")) {
                    sheets.push((name, id));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(sheets)
}

/// Relationship id → target from a `.rels` part.
fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, String>, ExtractError> {
    let mut targets = HashMap::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) = (attr_value(&e, b"Id"), attr_value(&e, b"Target"))
                {
                    targets.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

/// Letters in the widest column reference Excel allows (`XFD`).
const MAX_COLUMN_LETTERS: usize = 3;

/// Zero-based column index from a cell reference such as `AB12`.
/// References with more than three column letters are rejected.
fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() || letters.len() > MAX_COLUMN_LETTERS {
        return None;
    }
    let n = letters
        .iter()
        .fold(0usize, |acc, &b| acc * 26 + (b - b'A' + 1) as usize);
    Some(n - 1)
}

fn row_number(cell: &str) -> Option<usize> {
    cell.trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .ok()
}

/// Data rows (header excluded) spanned by a dimension reference such as
/// `A1:D120`.
fn dimension_data_rows(reference: &str) -> Option<usize> {
    let mut bounds = reference.split(':');
    let first = row_number(bounds.next()?)?;
    let last = match bounds.next() {
        Some(cell) => row_number(cell)?,
        None => first,
    };
    Some(last.saturating_sub(first))
}

#[derive(Default)]
struct CellState {
    column: Option<usize>,
    kind: Option<String>,
    value: String,
}

/// Parse at most `max_rows` rows of a worksheet.
pub fn read_sheet_rows(
    xml: &[u8],
    shared_strings: &[String],
    max_rows: usize,
) -> Result<SheetData, ExtractError> {
    let mut data = SheetData::default();
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut rows_seen = 0usize;
    let mut row: Option<Vec<String>> = None;
    let mut cell: Option<CellState> = None;
    let mut in_value = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    if rows_seen >= max_rows {
                        debug!(max_rows, "XLSX row cap reached");
                        break;
                    }
                    rows_seen += 1;
                    row = Some(Vec::new());
                }
                b"c" => cell = Some(start_cell(&e)),
                b"v" | b"t" if cell.is_some() => in_value = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"dimension" => {
                    data.declared_rows = attr_value(&e, b"ref").and_then(|r| dimension_data_rows(&r));
                }
                b"row" => {
                    if rows_seen >= max_rows {
                        break;
                    }
                    rows_seen += 1;
                }
                _ => {}
            },
            Ok(Event::Text(te)) if in_value => {
                if let Some(c) = cell.as_mut() {
                    c.value
                        .push_str(&te.unescape().map_err(|e| ExtractError::Ooxml(e.to_string()))?);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let (Some(c), Some(r)) = (cell.take(), row.as_mut()) {
                        place_cell(r, c, shared_strings);
                    }
                }
                b"row" => {
                    if let Some(r) = row.take() {
                        if r.iter().any(|v| !v.trim().is_empty()) {
                            data.rows.push(r);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(data)
}

fn start_cell(e: &BytesStart<'_>) -> CellState {
    CellState {
        column: attr_value(e, b"r").and_then(|r| column_index(&r)),
        kind: attr_value(e, b"t"),
        value: String::new(),
    }
}

fn place_cell(row: &mut Vec<String>, cell: CellState, shared_strings: &[String]) {
    let column = cell.column.unwrap_or(row.len());
    if column >= MAX_COLUMNS {
        return;
    }
    let value = match cell.kind.as_deref() {
        Some("s") => cell
            .value
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| shared_strings.get(i).cloned())
            .unwrap_or_default(),
        Some("b") => match cell.value.trim() {
            "1" => "VERDADEIRO".to_string(),
            "0" => "FALSO".to_string(),
            other => other.to_string(),
        },
        _ => cell.value,
    };
    if row.len() <= column {
        row.resize(column + 1, String::new());
    }
    row[column] = value;
}

/// Labeled summary of one sheet. The record count excludes the header
/// row, as in the CSV summary.
pub fn summarize_sheet(name: &str, data: &SheetData, max_cell_chars: usize) -> String {
    let mut out = format!("Planilha: {}\n", name);
    let total = data
        .declared_rows
        .unwrap_or_else(|| data.rows.len().saturating_sub(1));
    out.push_str(&format!("Total de registros: {}\n", total));

    let mut rows = data.rows.iter();
    match rows.next() {
        Some(header) => {
            out.push_str(&format!(
                "Cabeçalho: {}\n",
                format_row(header.iter().map(|s| s.as_str()), max_cell_chars)
            ));
            for (i, row) in rows.enumerate() {
                out.push_str(&format!(
                    "Linha {}: {}\n",
                    i + 1,
                    format_row(row.iter().map(|s| s.as_str()), max_cell_chars)
                ));
            }
        }
        None => out.push_str("(sem dados)\n"),
    }
    out
}
