//! Text chunking with configurable size and overlap.

use docchat_core::{AppError, AppResult};
use text_splitter::{ChunkConfig, TextSplitter};

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Character-based splitter that prefers paragraph, then line, then
/// sentence, then word boundaries before cutting inside a word.
pub struct Chunker {
    splitter: TextSplitter<text_splitter::Characters>,
    chunk_size: usize,
    overlap: usize,
}

impl std::fmt::Debug for Chunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunker")
            .field("chunk_size", &self.chunk_size)
            .field("overlap", &self.overlap)
            .finish()
    }
}

impl Chunker {
    /// Create a chunker. Overlap must be smaller than the chunk size.
    pub fn new(chunk_size: usize, overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::Config(
                "Chunk size must be greater than 0".to_string(),
            ));
        }

        let config = ChunkConfig::new(chunk_size)
            .with_overlap(overlap)
            .map_err(|e| AppError::Config(format!("Invalid chunk overlap: {}", e)))?;

        Ok(Self {
            splitter: TextSplitter::new(config),
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into trimmed, non-empty chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chunks: Vec<String> = self
            .splitter
            .chunks(text)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        tracing::trace!(
            "Chunked {} chars into {} chunks (size: {}, overlap: {})",
            text.chars().count(),
            chunks.len(),
            self.chunk_size,
            self.overlap
        );

        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        match Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP) {
            Ok(chunker) => chunker,
            Err(_) => Self {
                splitter: TextSplitter::new(ChunkConfig::new(DEFAULT_CHUNK_SIZE)),
                chunk_size: DEFAULT_CHUNK_SIZE,
                overlap: 0,
            },
        }
    }
}
