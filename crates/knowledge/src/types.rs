//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Upload formats the ingestion pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Csv,
}

/// Accepted extensions, sorted for error messages.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = [".csv", ".docx", ".pdf"];

impl FileType {
    /// Detect the file type from a file name's extension (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = extension_of(name);
        Self::from_extension(&ext)
    }

    /// Parse a lower-case extension including the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".pdf" => Some(Self::Pdf),
            ".docx" => Some(Self::Docx),
            ".csv" => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower-cased extension with its leading dot, or "" when there is none.
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Where a chunk came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Original upload file name
    pub source: String,

    /// 1-based page number (PDF only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// 1-based chunk index (within the page for PDFs)
    pub chunk: u32,

    #[serde(rename = "type")]
    pub file_type: FileType,

    /// Comma-separated header names (CSV only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<String>,
}

/// A chunk of extracted text plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(page_content: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            page_content: page_content.into(),
            metadata,
        }
    }
}

/// A document paired with its embedding vector, ready to store.
#[derive(Debug, Clone)]
pub struct EmbeddedDocument {
    pub document: Document,
    pub embedding: Vec<f32>,
}

/// A stored document returned by similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,

    /// Cosine similarity to the query (-1.0 to 1.0)
    pub score: f32,
}

/// Per-file totals for the stored collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub source: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub chunks: usize,
}

/// An uploaded file held in memory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Result of ingesting a batch of uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Number of files processed
    pub files: usize,

    /// Number of chunks embedded and stored
    pub chunks: usize,

    pub file_names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_name("report.PDF"), Some(FileType::Pdf));
        assert_eq!(FileType::from_name("notes.docx"), Some(FileType::Docx));
        assert_eq!(FileType::from_name("data.csv"), Some(FileType::Csv));
        assert_eq!(FileType::from_name("readme.txt"), None);
        assert_eq!(FileType::from_name("Makefile"), None);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.Tar.GZ"), ".gz");
        assert_eq!(extension_of("noext"), "");
    }

    #[test]
    fn test_metadata_serialization() {
        let metadata = DocumentMetadata {
            source: "a.pdf".to_string(),
            page: Some(2),
            chunk: 1,
            file_type: FileType::Pdf,
            columns: None,
        };

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["type"], "pdf");
        assert_eq!(json["page"], 2);
        assert!(json.get("columns").is_none());
    }
}
