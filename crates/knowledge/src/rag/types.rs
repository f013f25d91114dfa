//! RAG response types.

use crate::types::FileType;
use docchat_prompt::ResponseMode;
use serde::{Deserialize, Serialize};

/// Where part of an answer came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Upload file name
    pub source: String,

    #[serde(rename = "type")]
    pub file_type: FileType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<u32>,

    /// First 150 characters of the chunk, with "..." when cut
    pub snippet: String,
}

/// An answer plus the citations for the chunks it was given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<Citation>,
    pub mode: ResponseMode,
}
