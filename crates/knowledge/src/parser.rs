//! Text extraction from uploaded PDF, DOCX and CSV bytes.

use docchat_core::{AppError, AppResult};
use std::io::{Cursor, Read};

/// Extracted CSV content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvText {
    /// Header names in file order
    pub columns: Vec<String>,

    /// One `col: val | col: val` line per record
    pub rows: Vec<String>,
}

/// Extract text from each page of a PDF, in page order.
///
/// Pages without text come back as empty strings so indexes stay aligned
/// with 1-based page numbers.
pub fn extract_pdf_pages(name: &str, bytes: &[u8]) -> AppResult<Vec<String>> {
    // pdf-extract panics on some malformed inputs
    let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes));

    match result {
        Ok(Ok(pages)) => {
            tracing::debug!("Extracted {} pages from {}", pages.len(), name);
            Ok(pages)
        }
        Ok(Err(e)) => Err(AppError::Ingest(format!(
            "Failed to read PDF '{}': {}",
            name, e
        ))),
        Err(_) => Err(AppError::Ingest(format!(
            "Failed to read PDF '{}': document could not be parsed",
            name
        ))),
    }
}

/// Extract paragraph text from a DOCX package.
///
/// Non-blank paragraphs of `word/document.xml` are joined with newlines.
pub fn extract_docx_text(name: &str, bytes: &[u8]) -> AppResult<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AppError::Ingest(format!("Failed to open DOCX '{}': {}", name, e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| {
            AppError::Ingest(format!(
                "Failed to open DOCX '{}': missing word/document.xml ({})",
                name, e
            ))
        })?
        .read_to_string(&mut xml)
        .map_err(|e| AppError::Ingest(format!("Failed to read DOCX '{}': {}", name, e)))?;

    let paragraphs = docx_paragraphs(&xml);
    tracing::debug!("Extracted {} paragraphs from {}", paragraphs.len(), name);

    Ok(paragraphs
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Render CSV records as `column: value` pairs.
///
/// The first row is the header. Empty cells render as empty values.
pub fn extract_csv_rows(name: &str, bytes: &[u8]) -> AppResult<CsvText> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::Ingest(format!("Failed to read CSV '{}': {}", name, e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| AppError::Ingest(format!("Failed to read CSV '{}': {}", name, e)))?;

        let row = columns
            .iter()
            .zip(record.iter())
            .map(|(col, val)| format!("{}: {}", col, val))
            .collect::<Vec<_>>()
            .join(" | ");
        rows.push(row);
    }

    tracing::debug!(
        "Extracted {} rows ({} columns) from {}",
        rows.len(),
        columns.len(),
        name
    );

    Ok(CsvText { columns, rows })
}

/// Walk WordprocessingML and collect the text of each `<w:p>`.
///
/// Text boxes (`w:txbxContent`) are skipped; their paragraphs are nested
/// inside a run of the surrounding paragraph and are not part of its text.
fn docx_paragraphs(xml: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_text = false;
    let mut in_props = false;
    let mut text_box_depth = 0usize;
    let mut rest = xml;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            break;
        };

        if in_text && text_box_depth == 0 && lt > 0 {
            push_text(&mut open, &rest[..lt]);
        }

        let Some(gt) = rest[lt..].find('>') else {
            break;
        };
        let tag = &rest[lt + 1..lt + gt];
        rest = &rest[lt + gt + 1..];

        let closing = tag.starts_with('/');
        let self_closing = tag.ends_with('/');
        let tag_name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("");

        if tag_name == "w:txbxContent" && !self_closing {
            if closing {
                text_box_depth = text_box_depth.saturating_sub(1);
            } else {
                text_box_depth += 1;
                in_text = false;
            }
            continue;
        }
        if text_box_depth > 0 {
            continue;
        }

        match (tag_name, closing) {
            ("w:p", false) => {
                if self_closing {
                    paragraphs.push(String::new());
                } else {
                    open.push(String::new());
                }
            }
            ("w:p", true) => {
                if let Some(text) = open.pop() {
                    paragraphs.push(text);
                }
                in_text = false;
            }
            ("w:pPr", false) => in_props = !self_closing,
            ("w:pPr", true) => in_props = false,
            ("w:t", false) => in_text = !self_closing,
            ("w:t", true) => in_text = false,
            // Tab stops inside paragraph properties are layout, not text
            ("w:tab", false) if !in_props => push_raw(&mut open, '\t'),
            ("w:br", false) | ("w:cr", false) => push_raw(&mut open, '\n'),
            _ => {}
        }
    }

    paragraphs
}

fn push_text(open: &mut [String], raw: &str) {
    if let Some(text) = open.last_mut() {
        text.push_str(&decode_entities(raw));
    }
}

fn push_raw(open: &mut [String], ch: char) {
    if let Some(text) = open.last_mut() {
        text.push(ch);
    }
}

/// Decode the predefined XML entities and numeric character references.
fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];

        let decoded = after.find(';').and_then(|semi| {
            let entity = &after[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16)
                        .ok()
                        .and_then(char::from_u32)
                }
                _ if entity.starts_with('#') => {
                    entity[1..].parse::<u32>().ok().and_then(char::from_u32)
                }
                _ => None,
            };
            ch.map(|c| (c, semi))
        });

        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
