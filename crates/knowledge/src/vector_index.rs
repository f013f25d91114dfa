//! Vector store abstraction for embedded document chunks.

use crate::types::{EmbeddedDocument, ScoredDocument, SourceSummary};
use docchat_core::AppResult;

/// Trait for vector store backends.
///
/// Implementations must support:
/// - Adding documents with embeddings (idempotent per chunk)
/// - Searching for similar vectors (top-k)
/// - Per-source statistics
/// - Clearing the collection
pub trait VectorStore: Send {
    /// Add documents and return how many were written.
    fn add_documents(&mut self, documents: &[EmbeddedDocument]) -> AppResult<usize>;

    /// Search for the `k` most similar documents, by descending score.
    fn search(&self, query_embedding: &[f32], k: usize) -> AppResult<Vec<ScoredDocument>>;

    /// Number of stored chunks.
    fn count(&self) -> AppResult<usize>;

    /// Stored sources ordered by name.
    fn sources(&self) -> AppResult<Vec<SourceSummary>>;

    /// Remove every document.
    fn clear(&mut self) -> AppResult<()>;

    /// Commit any pending changes (for backends that buffer writes).
    fn flush(&mut self) -> AppResult<()> {
        Ok(())
    }
}
