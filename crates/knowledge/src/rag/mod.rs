//! Retrieval-augmented answering.

pub mod answer;
pub mod types;

pub use answer::{build_context_string, extract_sources, RagChain};
pub use types::{Citation, RagAnswer};
