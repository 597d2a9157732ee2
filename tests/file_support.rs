//! Integration tests for per-format extraction.
//!
//! Fixtures are built in memory: DOCX and XLSX as ZIP archives via
//! `zip::ZipWriter`, PDFs as hand-assembled documents with a correct xref
//! table so both `pdf-extract` and `lopdf` can parse them.

use std::io::Write;

use lidia_context::config::Config;
use lidia_context::extract::pdf::{failed_page_marker, PdfPageExtractor};
use lidia_context::extract::{extract, ExtractError, ExtractOptions};
use lidia_context::models::{
    ExtractionMethod, FailureKind, FileFormat, SourceFile, PLACEHOLDER_UNSUPPORTED,
};
use lidia_context::traits::{ExtractorRegistry, TextExtractor};

/// What a fixture page holds.
#[derive(Clone, Copy)]
enum PageBody<'a> {
    /// A content stream showing this text in Helvetica.
    Text(&'a str),
    /// A content stream that is not a valid operator sequence.
    Garbage,
    /// `/Contents` points at an object that does not exist.
    MissingStream,
}

/// PDF with one page per entry of `pages`, each showing that text in Helvetica.
fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let bodies: Vec<PageBody<'_>> = pages.iter().map(|t| PageBody::Text(t)).collect();
    pdf_with_bodies(&bodies)
}

fn pdf_with_bodies(pages: &[PageBody<'_>]) -> Vec<u8> {
    let n = pages.len();
    let first_page_obj = 4;
    let mut objects: Vec<String> = Vec::new();
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids = (0..n)
        .map(|i| format!("{} 0 R", first_page_obj + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");
    objects.push(format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, n));
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    );
    for (i, body) in pages.iter().enumerate() {
        let content_obj = match body {
            PageBody::MissingStream => 999,
            _ => first_page_obj + 2 * i + 1,
        };
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents {} 0 R /Resources << /Font << /F1 3 0 R >> >> >>",
            content_obj
        ));
        let stream = match body {
            PageBody::Text(text) => format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text),
            PageBody::Garbage => ")))]]]>>> }}}".to_string(),
            PageBody::MissingStream => "BT ET".to_string(),
        };
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ));
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref_start = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer << /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        )
        .as_bytes(),
    );
    out
}

fn zip_with_entries(entries: &[(&str, String)]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        for (name, content) in entries {
            zip.start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buf
}

fn docx_with_body(body: &str) -> Vec<u8> {
    let xml = format!(
        "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
        body
    );
    zip_with_entries(&[("word/document.xml", xml)])
}

fn paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", text)
}

/// XLSX whose sheets are `(name, rows)`; every cell is an inline string.
fn xlsx_with_sheets(sheets: &[(&str, Vec<Vec<&str>>)]) -> Vec<u8> {
    let main_ns = "xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\"";
    let rel_ns = "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"";

    let sheet_entries: String = sheets
        .iter()
        .enumerate()
        .map(|(i, (name, _))| {
            format!(
                "<sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>",
                name,
                i + 1,
                i + 1
            )
        })
        .collect();
    let workbook = format!(
        "<?xml version=\"1.0\"?><workbook {} {}><sheets>{}</sheets></workbook>",
        main_ns, rel_ns, sheet_entries
    );
    let rels: String = (1..=sheets.len())
        .map(|i| {
            format!(
                "<Relationship Id=\"rId{i}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{i}.xml\"/>"
            )
        })
        .collect();
    let rels = format!(
        "<?xml version=\"1.0\"?><Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">{}</Relationships>",
        rels
    );

    let mut entries = vec![
        ("xl/workbook.xml".to_string(), workbook),
        ("xl/_rels/workbook.xml.rels".to_string(), rels),
    ];
    for (i, (_, rows)) in sheets.iter().enumerate() {
        entries.push((format!("xl/worksheets/sheet{}.xml", i + 1), sheet_xml(rows)));
    }
    let borrowed: Vec<(&str, String)> = entries
        .iter()
        .map(|(name, content)| (name.as_str(), content.clone()))
        .collect();
    zip_with_entries(&borrowed)
}

fn sheet_xml(rows: &[Vec<&str>]) -> String {
    let body: String = rows
        .iter()
        .enumerate()
        .map(|(r, cells)| {
            let cells: String = cells
                .iter()
                .enumerate()
                .map(|(c, value)| {
                    format!(
                        "<c r=\"{}{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                        (b'A' + c as u8) as char,
                        r + 1,
                        value
                    )
                })
                .collect();
            format!("<row r=\"{}\">{}</row>", r + 1, cells)
        })
        .collect();
    format!(
        "<?xml version=\"1.0\"?><worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\"><sheetData>{}</sheetData></worksheet>",
        body
    )
}

fn run(filename: &str, bytes: Vec<u8>) -> lidia_context::models::ExtractionResult {
    extract(
        &SourceFile::new(filename, bytes),
        &ExtractorRegistry::with_defaults(),
        &ExtractOptions::default(),
    )
}

fn options_with(config: Config) -> ExtractOptions {
    ExtractOptions::from_config(&config)
}

// ─── PDF ────────────────────────────────────────────────────────────

#[test]
fn pdf_text_is_extracted_by_primary() {
    let result = run("relatorio.PDF", pdf_with_pages(&["analise de resultados"]));
    assert_eq!(result.method, ExtractionMethod::Primary, "{}", result.diagnostic);
    assert!(result.raw_text.contains("analise de resultados"));
}

#[test]
fn pdf_page_fallback_reads_every_page() {
    let mut registry = ExtractorRegistry::new();
    registry.register(FileFormat::Pdf, Box::new(PdfPageExtractor));
    let file = SourceFile::new(
        "ata.pdf",
        pdf_with_pages(&["pagina um", "pagina dois", "pagina tres"]),
    );
    let result = extract(&file, &registry, &ExtractOptions::default());
    assert!(!result.is_failed(), "{}", result.diagnostic);
    for phrase in ["pagina um", "pagina dois", "pagina tres"] {
        assert!(result.raw_text.contains(phrase), "missing {phrase}");
    }
}

#[test]
fn pdf_pages_past_cap_are_not_read() {
    let mut config = Config::default();
    config.limits.max_pdf_pages = 2;
    let bytes = pdf_with_pages(&["pagina um", "pagina dois", "pagina tres"]);

    let primary = extract(
        &SourceFile::new("a.pdf", bytes.clone()),
        &ExtractorRegistry::with_defaults(),
        &options_with(config.clone()),
    );
    assert!(!primary.is_failed(), "{}", primary.diagnostic);
    assert!(primary.raw_text.contains("pagina dois"));
    assert!(!primary.raw_text.contains("pagina tres"));

    let mut registry = ExtractorRegistry::new();
    registry.register(FileFormat::Pdf, Box::new(PdfPageExtractor));
    let fallback = extract(&SourceFile::new("a.pdf", bytes), &registry, &options_with(config));
    assert!(fallback.raw_text.contains("pagina dois"));
    assert!(!fallback.raw_text.contains("pagina tres"));
}

struct BrokenPdf;

impl TextExtractor for BrokenPdf {
    fn name(&self) -> &str {
        "broken-pdf"
    }

    fn extract(&self, _bytes: &[u8], _options: &ExtractOptions) -> Result<String, ExtractError> {
        Err(ExtractError::Pdf("injected fault".to_string()))
    }
}

const FOUR_PAGES_THIRD_BROKEN: [&str; 3] = ["pagina um", "pagina dois", "pagina quatro"];

fn assert_three_pages_and_marker(text: &str) {
    for phrase in FOUR_PAGES_THIRD_BROKEN {
        assert!(text.contains(phrase), "missing {phrase} in {text:?}");
    }
    assert!(text.contains(&failed_page_marker(3)), "no marker in {text:?}");
    assert!(!text.contains(&failed_page_marker(1)));
}

#[test]
fn pdf_page_with_missing_content_gets_marker() {
    let bytes = pdf_with_bodies(&[
        PageBody::Text("pagina um"),
        PageBody::Text("pagina dois"),
        PageBody::MissingStream,
        PageBody::Text("pagina quatro"),
    ]);
    let result = run("relatorio.pdf", bytes);
    assert_eq!(result.method, ExtractionMethod::Primary, "{}", result.diagnostic);
    assert_three_pages_and_marker(&result.raw_text);
}

#[test]
fn pdf_page_with_undecodable_content_gets_marker() {
    let bytes = pdf_with_bodies(&[
        PageBody::Text("pagina um"),
        PageBody::Text("pagina dois"),
        PageBody::Garbage,
        PageBody::Text("pagina quatro"),
    ]);
    let result = run("relatorio.pdf", bytes);
    assert!(!result.is_failed(), "{}", result.diagnostic);
    assert_three_pages_and_marker(&result.raw_text);
}

#[test]
fn failing_pdf_primary_falls_back_to_pages() {
    let mut registry = ExtractorRegistry::new();
    registry.register(FileFormat::Pdf, Box::new(BrokenPdf));
    registry.register(FileFormat::Pdf, Box::new(PdfPageExtractor));
    let bytes = pdf_with_bodies(&[
        PageBody::Text("pagina um"),
        PageBody::Text("pagina dois"),
        PageBody::MissingStream,
        PageBody::Text("pagina quatro"),
    ]);
    let result = extract(&SourceFile::new("ata.pdf", bytes), &registry, &ExtractOptions::default());
    assert_eq!(result.method, ExtractionMethod::Fallback, "{}", result.diagnostic);
    assert!(result.diagnostic.contains("broken-pdf: PDF extraction failed: injected fault"));
    assert_three_pages_and_marker(&result.raw_text);
}

#[test]
fn corrupted_pdf_fails_with_placeholder() {
    let mut bytes = pdf_with_pages(&["texto"]);
    bytes.truncate(40);
    let result = run("quebrado.pdf", bytes);
    assert!(result.is_failed());
    assert_eq!(result.failure, Some(FailureKind::ExtractionFailure));
    assert!(result.diagnostic.contains("pdf-extract-layout"));
    assert!(result.diagnostic.contains("lopdf-pages"));
}

// ─── DOCX ───────────────────────────────────────────────────────────

#[test]
fn docx_paragraphs_in_document_order() {
    let body = format!(
        "{}{}{}",
        paragraph("Introdução"),
        paragraph("Objetivo do projeto"),
        paragraph("Conclusão")
    );
    let result = run("projeto.docx", docx_with_body(&body));
    assert_eq!(result.method, ExtractionMethod::Primary);
    let intro = result.raw_text.find("Introdução").unwrap();
    let goal = result.raw_text.find("Objetivo do projeto").unwrap();
    let end = result.raw_text.find("Conclusão").unwrap();
    assert!(intro < goal && goal < end);
}

#[test]
fn docx_with_malformed_runs_falls_back_to_structure_walk() {
    // Text outside any run: the stream yields only newlines.
    let body = "<w:tbl><w:tr><w:tc><w:p><w:fldSimple><w:t>Campo</w:t></w:fldSimple></w:p></w:tc></w:tr></w:tbl>";
    let result = run("campos.docx", docx_with_body(body));
    assert_eq!(result.method, ExtractionMethod::Fallback, "{}", result.diagnostic);
    assert_eq!(result.raw_text, "Campo");
    assert!(result.diagnostic.contains("docx-xml-stream: empty output"));
}

#[test]
fn docx_without_document_part_fails() {
    let bytes = zip_with_entries(&[("word/styles.xml", "<w:styles/>".to_string())]);
    let result = run("vazio.docx", bytes);
    assert_eq!(result.failure, Some(FailureKind::ExtractionFailure));
}

// ─── XLSX ───────────────────────────────────────────────────────────

#[test]
fn xlsx_sheets_are_summarized_by_name() {
    let bytes = xlsx_with_sheets(&[
        (
            "Ensaios",
            vec![vec!["Amostra", "Resultado"], vec!["A1", "95%"], vec!["A2", "87%"]],
        ),
        ("Custos", vec![vec!["Item", "Valor"], vec!["Sensor", "120"]]),
    ]);
    let result = run("dados.xlsx", bytes);
    assert_eq!(result.method, ExtractionMethod::Primary, "{}", result.diagnostic);
    let text = &result.raw_text;
    assert!(text.contains("Planilha: Ensaios"));
    assert!(text.contains("Cabeçalho: Amostra | Resultado"));
    assert!(text.contains("Linha 2: A2 | 87%"));
    assert!(text.contains("Planilha: Custos"));
    assert!(text.find("Ensaios").unwrap() < text.find("Custos").unwrap());
}

#[test]
fn xlsx_sheet_and_row_caps() {
    let rows: Vec<Vec<&str>> = (0..80).map(|_| vec!["x", "y"]).collect();
    let sheets: Vec<(&str, Vec<Vec<&str>>)> = ["S1", "S2", "S3", "S4", "S5", "S6", "S7"]
        .iter()
        .map(|name| (*name, rows.clone()))
        .collect();
    let result = run("grande.xlsx", xlsx_with_sheets(&sheets));
    let text = &result.raw_text;
    assert!(text.contains("Planilha: S5"));
    assert!(!text.contains("Planilha: S6"));
    // Header plus 49 data rows per sheet at the default cap of 50.
    assert!(text.contains("Linha 49:"));
    assert!(!text.contains("Linha 50:"));
}

#[test]
fn xlsx_without_workbook_uses_sheet_files() {
    let bytes = zip_with_entries(&[(
        "xl/worksheets/sheet1.xml",
        sheet_xml(&[vec!["Coluna"], vec!["valor"]]),
    )]);
    let result = run("solta.xlsx", bytes);
    assert!(result.raw_text.contains("Planilha: Planilha 1"), "{}", result.raw_text);
    assert!(result.raw_text.contains("Linha 1: valor"));
}

#[test]
fn bare_suffix_filename_is_recognized() {
    let result = run(".txt", "Resumo do ensaio de tração.".as_bytes().to_vec());
    assert_eq!(result.method, ExtractionMethod::Primary);
    assert_eq!(result.raw_text, "Resumo do ensaio de tração.");
}

// ─── TXT / CSV ──────────────────────────────────────────────────────

#[test]
fn latin1_txt_keeps_accents() {
    let original = "Relatório técnico: avaliação, conclusão e manutenção das peças.";
    let bytes: Vec<u8> = original.chars().map(|c| c as u32 as u8).collect();
    let result = run("notas.txt", bytes);
    assert_eq!(result.method, ExtractionMethod::Primary);
    assert_eq!(result.raw_text, original);
}

#[test]
fn semicolon_csv_is_summarized() {
    let csv = "produto;preço;quantidade\nParafuso;0,50;100\nPorca;0,30;200\n";
    let result = run("estoque.csv", csv.as_bytes().to_vec());
    assert!(result.raw_text.contains("Colunas (3): produto | preço | quantidade"));
    assert!(result.raw_text.contains("Total de registros: 2"));
    assert!(result.raw_text.contains("Linha 2: Porca | 0,30 | 200"));
}

// ─── Unsupported ────────────────────────────────────────────────────

#[test]
fn unsupported_formats_return_exact_placeholder() {
    for name in ["foto.png", "apresentacao.pptx", "planilha.xls", "sem_extensao", "arquivo.docx.bak", "pdf"] {
        let result = run(name, b"conteudo".to_vec());
        assert_eq!(result.raw_text, PLACEHOLDER_UNSUPPORTED, "{name}");
        assert_eq!(result.failure, Some(FailureKind::UnsupportedFormat));
    }
}
