//! CSV summarization.
//!
//! A raw table is a poor LLM context: thousands of rows of numbers drown
//! the question. Instead the CSV becomes a short labeled summary: the
//! header, the total record count, and a capped sample of rows with each
//! cell truncated.

use csv::ReaderBuilder;
use tracing::debug;

use super::text::decode_text;
use super::{format_row, ExtractError, ExtractOptions};
use crate::traits::TextExtractor;

/// Delimiters tried, in preference order.
pub const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Characters of the file examined when probing for the delimiter.
const PROBE_CHARS: usize = 1000;

/// `.csv` extraction: decode, detect the delimiter, summarize.
pub struct CsvSummaryExtractor;

impl TextExtractor for CsvSummaryExtractor {
    fn name(&self) -> &str {
        "csv-summary"
    }

    fn extract(&self, bytes: &[u8], options: &ExtractOptions) -> Result<String, ExtractError> {
        let decoded = decode_text(bytes, &options.encodings);
        let delimiter = detect_delimiter(&decoded.text);
        debug!(delimiter = %(delimiter as char), encoding = decoded.encoding, "CSV dialect");
        summarize_csv(
            &decoded.text,
            delimiter,
            options.limits.max_csv_sample_rows,
            options.limits.max_cell_chars,
        )
    }
}

/// Pick the delimiter whose first record has the most columns.
///
/// Ties keep the earliest candidate, so `,` wins when nothing beats it.
pub fn detect_delimiter(text: &str) -> u8 {
    let sample = match text.char_indices().nth(PROBE_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    };

    let mut best = DELIMITER_CANDIDATES[0];
    let mut best_columns = 0usize;
    for &candidate in &DELIMITER_CANDIDATES {
        let columns = first_record_width(sample, candidate);
        if columns > best_columns {
            best = candidate;
            best_columns = columns;
        }
    }
    best
}

fn first_record_width(sample: &str, delimiter: u8) -> usize {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(sample.as_bytes());
    match reader.records().next() {
        Some(Ok(record)) => record.len(),
        _ => 0,
    }
}

/// Render the labeled summary of a CSV document.
pub fn summarize_csv(
    text: &str,
    delimiter: u8,
    max_sample_rows: usize,
    max_cell_chars: usize,
) -> Result<String, ExtractError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record.map_err(|e| ExtractError::Csv(e.to_string()))?,
        None => return Err(ExtractError::Empty("CSV has no rows".to_string())),
    };

    let mut total = 0usize;
    let mut sample = Vec::new();
    for record in records {
        let record = record.map_err(|e| ExtractError::Csv(e.to_string()))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        total += 1;
        if sample.len() < max_sample_rows {
            sample.push(format_row(record.iter(), max_cell_chars));
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Colunas ({}): {}\n",
        header.len(),
        format_row(header.iter(), max_cell_chars)
    ));
    out.push_str(&format!("Total de registros: {}\n", total));
    if !sample.is_empty() {
        out.push_str("\nAmostra dos registros:\n");
        for (i, row) in sample.iter().enumerate() {
            out.push_str(&format!("Linha {}: {}\n", i + 1, row));
        }
    }
    let remaining = total - sample.len();
    if remaining > 0 {
        out.push_str(&format!("... e mais {} registros\n", remaining));
    }
    Ok(out)
}
