//! Error types for docchat.
//!
//! A single error enum covers configuration, I/O, LLM, knowledge base,
//! document ingestion and prompt failures.

use thiserror::Error;

/// Unified error type.
///
/// All library functions return `Result<T, AppError>`; errors are
/// represented and propagated, never panicked on.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Vector store and embedding errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Text extraction failures for an uploaded document
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// Upload with an extension we cannot parse
    #[error("{0}")]
    UnsupportedFile(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_file_message_is_bare() {
        let err = AppError::UnsupportedFile("Unsupported file type: .txt".to_string());
        assert_eq!(err.to_string(), "Unsupported file type: .txt");
    }

    #[test]
    fn test_yaml_error_converts_to_serialization() {
        let parsed: Result<Vec<u32>, _> = serde_yaml::from_str("not: [a list");
        let err: AppError = parsed.unwrap_err().into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
