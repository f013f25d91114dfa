//! Turn uploaded files into chunked documents.

use crate::chunker::Chunker;
use crate::parser;
use crate::types::{
    extension_of, Document, DocumentMetadata, FileType, UploadedFile, SUPPORTED_EXTENSIONS,
};
use docchat_core::{AppError, AppResult};

/// Parse and chunk a single upload according to its extension.
pub fn ingest_file(name: &str, bytes: &[u8], chunker: &Chunker) -> AppResult<Vec<Document>> {
    let file_type = FileType::from_name(name).ok_or_else(|| unsupported(name))?;

    let documents = match file_type {
        FileType::Pdf => {
            let pages = parser::extract_pdf_pages(name, bytes)?;
            chunk_pages(name, &pages, chunker)
        }
        FileType::Docx => {
            let text = parser::extract_docx_text(name, bytes)?;
            chunk_text(name, &text, FileType::Docx, None, chunker)
        }
        FileType::Csv => {
            let csv = parser::extract_csv_rows(name, bytes)?;
            let columns = csv.columns.join(", ");
            chunk_text(
                name,
                &csv.rows.join("\n"),
                FileType::Csv,
                Some(columns),
                chunker,
            )
        }
    };

    tracing::info!(
        "Ingested {} ({}): {} chunks",
        name,
        file_type,
        documents.len()
    );

    Ok(documents)
}

/// Ingest several uploads, stopping at the first file that fails.
pub fn ingest_files(files: &[UploadedFile], chunker: &Chunker) -> AppResult<Vec<Document>> {
    let mut all_docs = Vec::new();

    for file in files {
        let docs = ingest_file(&file.name, &file.bytes, chunker).inspect_err(|e| {
            tracing::warn!("Failed to ingest {}: {}", file.name, e);
        })?;
        all_docs.extend(docs);
    }

    Ok(all_docs)
}

/// Chunk each non-blank page independently, numbering chunks per page.
pub fn chunk_pages(name: &str, pages: &[String], chunker: &Chunker) -> Vec<Document> {
    let mut documents = Vec::new();

    for (index, text) in pages.iter().enumerate() {
        if text.trim().is_empty() {
            continue;
        }

        let page = (index + 1) as u32;
        for (chunk_index, chunk) in chunker.split(text).into_iter().enumerate() {
            documents.push(Document::new(
                chunk,
                DocumentMetadata {
                    source: name.to_string(),
                    page: Some(page),
                    chunk: (chunk_index + 1) as u32,
                    file_type: FileType::Pdf,
                    columns: None,
                },
            ));
        }
    }

    documents
}

fn chunk_text(
    name: &str,
    text: &str,
    file_type: FileType,
    columns: Option<String>,
    chunker: &Chunker,
) -> Vec<Document> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    chunker
        .split(text)
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            Document::new(
                chunk,
                DocumentMetadata {
                    source: name.to_string(),
                    page: None,
                    chunk: (index + 1) as u32,
                    file_type,
                    columns: columns.clone(),
                },
            )
        })
        .collect()
}

fn unsupported(name: &str) -> AppError {
    AppError::UnsupportedFile(format!(
        "Unsupported file type: {}. Supported: {}",
        extension_of(name),
        SUPPORTED_EXTENSIONS.join(", ")
    ))
}
