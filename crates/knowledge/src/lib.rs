//! Document knowledge base.
//!
//! Upload handling (PDF, DOCX, CSV), chunking, embeddings, a SQLite vector
//! store and retrieval-augmented answering over the stored chunks.

pub mod chunker;
pub mod embeddings;
pub mod ingest;
pub mod knowledge_base;
pub mod parser;
pub mod rag;
pub mod store;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

pub use chunker::Chunker;
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use ingest::{ingest_file, ingest_files};
pub use knowledge_base::{EmbeddingInfo, KnowledgeBase};
pub use rag::{build_context_string, extract_sources, Citation, RagAnswer, RagChain};
pub use store::SqliteStore;
pub use types::{
    Document, DocumentMetadata, EmbeddedDocument, FileType, IngestReport, ScoredDocument,
    SourceSummary, UploadedFile, SUPPORTED_EXTENSIONS,
};
pub use vector_index::VectorStore;
