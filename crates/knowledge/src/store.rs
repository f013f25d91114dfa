//! SQLite-backed vector store.
//!
//! Documents and their embeddings live in a single `store.db`. Embeddings
//! are little-endian f32 BLOBs ranked by exact cosine similarity at query
//! time. Each collection records the embedding provider, model and
//! dimensions it was created with.

use crate::embeddings::EmbeddingConfig;
use crate::types::{
    Document, DocumentMetadata, EmbeddedDocument, FileType, ScoredDocument, SourceSummary,
};
use crate::vector_index::VectorStore;
use chrono::Utc;
use docchat_core::{AppError, AppResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Maximum documents written per transaction.
const INSERT_BATCH_SIZE: usize = 100;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS collections (
    name TEXT PRIMARY KEY,
    provider TEXT NOT NULL,
    model TEXT NOT NULL,
    dimensions INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    id TEXT NOT NULL,
    collection TEXT NOT NULL,
    source TEXT NOT NULL,
    file_type TEXT NOT NULL,
    page INTEGER,
    chunk INTEGER NOT NULL,
    columns TEXT,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    added_at TEXT NOT NULL,
    PRIMARY KEY (collection, id),
    FOREIGN KEY (collection) REFERENCES collections(name)
);

CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(collection, source);
"#;

/// A vector store collection in a SQLite database.
pub struct SqliteStore {
    conn: Connection,
    collection: String,
    dimensions: usize,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("collection", &self.collection)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl SqliteStore {
    /// Open (or create) a collection in the database at `path`.
    ///
    /// # Errors
    /// Fails if the collection already exists with a different embedding
    /// provider, model or dimension count.
    pub fn open(path: &Path, collection: &str, embedding: &EmbeddingConfig) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create store directory: {}", e))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open vector store: {}", e)))?;

        tracing::debug!("Opened vector store at {:?}", path);
        Self::init(conn, collection, embedding)
    }

    /// Open a throwaway in-memory collection.
    pub fn open_in_memory(collection: &str, embedding: &EmbeddingConfig) -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Knowledge(format!("Failed to open vector store: {}", e)))?;
        Self::init(conn, collection, embedding)
    }

    fn init(conn: Connection, collection: &str, embedding: &EmbeddingConfig) -> AppResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))?;

        let existing = conn
            .query_row(
                "SELECT provider, model, dimensions FROM collections WHERE name = ?1",
                params![collection],
                |row| {
                    Ok(EmbeddingConfig {
                        provider: row.get(0)?,
                        model: row.get(1)?,
                        dimensions: row.get::<_, i64>(2)? as usize,
                        ..EmbeddingConfig::default()
                    })
                },
            )
            .optional()
            .map_err(|e| AppError::Knowledge(format!("Failed to read collection: {}", e)))?;

        match existing {
            Some(stored) => {
                stored.validate_consistency(embedding).map_err(|e| {
                    AppError::Knowledge(format!(
                        "Collection '{}' was created with {} / {} ({} dims): {}",
                        collection, stored.provider, stored.model, stored.dimensions, e
                    ))
                })?;
            }
            None => {
                conn.execute(
                    "INSERT INTO collections (name, provider, model, dimensions, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        collection,
                        embedding.provider,
                        embedding.model,
                        embedding.dimensions as i64,
                        Utc::now().to_rfc3339(),
                    ],
                )
                .map_err(|e| AppError::Knowledge(format!("Failed to create collection: {}", e)))?;
                tracing::info!(
                    "Created collection '{}' ({} / {}, {} dims)",
                    collection,
                    embedding.provider,
                    embedding.model,
                    embedding.dimensions
                );
            }
        }

        Ok(Self {
            conn,
            collection: collection.to_string(),
            dimensions: embedding.dimensions,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl VectorStore for SqliteStore {
    fn add_documents(&mut self, documents: &[EmbeddedDocument]) -> AppResult<usize> {
        if let Some(bad) = documents
            .iter()
            .find(|d| d.embedding.len() != self.dimensions)
        {
            return Err(AppError::Knowledge(format!(
                "Dimension mismatch: expected {}, got {} for {}",
                self.dimensions,
                bad.embedding.len(),
                bad.document.metadata.source
            )));
        }

        let added_at = Utc::now().to_rfc3339();
        let mut written = 0;

        for batch in documents.chunks(INSERT_BATCH_SIZE) {
            let tx = self
                .conn
                .transaction()
                .map_err(|e| AppError::Knowledge(format!("Failed to begin transaction: {}", e)))?;
            {
                let mut stmt = tx
                    .prepare_cached(
                        "INSERT OR REPLACE INTO documents
                         (id, collection, source, file_type, page, chunk, columns, content, embedding, added_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    )
                    .map_err(|e| AppError::Knowledge(format!("Failed to prepare insert: {}", e)))?;

                for item in batch {
                    let doc = &item.document;
                    let meta = &doc.metadata;
                    stmt.execute(params![
                        document_id(doc),
                        self.collection,
                        meta.source,
                        meta.file_type.as_str(),
                        meta.page.map(i64::from),
                        i64::from(meta.chunk),
                        meta.columns,
                        doc.page_content,
                        embedding_to_bytes(&item.embedding),
                        added_at,
                    ])
                    .map_err(|e| AppError::Knowledge(format!("Failed to insert document: {}", e)))?;
                }
            }
            tx.commit()
                .map_err(|e| AppError::Knowledge(format!("Failed to commit documents: {}", e)))?;
            written += batch.len();
        }

        tracing::debug!(
            "Stored {} documents in collection '{}'",
            written,
            self.collection
        );

        Ok(written)
    }

    fn search(&self, query_embedding: &[f32], k: usize) -> AppResult<Vec<ScoredDocument>> {
        let count = self.count()?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let k = k.min(count);

        let mut stmt = self
            .conn
            .prepare(
                "SELECT source, file_type, page, chunk, columns, content, embedding
                 FROM documents WHERE collection = ?1",
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![self.collection], |row| {
                let file_type: String = row.get(1)?;
                let file_type = FileType::from_extension(&format!(".{}", file_type)).ok_or_else(
                    || {
                        rusqlite::Error::FromSqlConversionFailure(
                            1,
                            Type::Text,
                            format!("unknown file type '{}'", file_type).into(),
                        )
                    },
                )?;

                let bytes: Vec<u8> = row.get(6)?;
                let embedding = bytes_to_embedding(&bytes).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(6, Type::Blob, Box::new(e))
                })?;

                let document = Document::new(
                    row.get::<_, String>(5)?,
                    DocumentMetadata {
                        source: row.get(0)?,
                        page: row.get::<_, Option<i64>>(2)?.map(|p| p as u32),
                        chunk: row.get::<_, i64>(3)? as u32,
                        file_type,
                        columns: row.get(4)?,
                    },
                );

                Ok((document, embedding))
            })
            .map_err(|e| AppError::Knowledge(format!("Failed to query documents: {}", e)))?;

        let mut results = rows
            .map(|row| {
                row.map(|(document, embedding)| ScoredDocument {
                    score: cosine_similarity(query_embedding, &embedding),
                    document,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Knowledge(format!("Failed to read document: {}", e)))?;

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        tracing::debug!(
            "Retrieved {} documents (requested top-{}), best score {:.3}",
            results.len(),
            k,
            results.first().map(|r| r.score).unwrap_or(0.0)
        );

        Ok(results)
    }

    fn count(&self) -> AppResult<usize> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                params![self.collection],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n as usize)
            .map_err(|e| AppError::Knowledge(format!("Failed to count documents: {}", e)))
    }

    fn sources(&self) -> AppResult<Vec<SourceSummary>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT source, file_type, COUNT(*) FROM documents
                 WHERE collection = ?1
                 GROUP BY source, file_type
                 ORDER BY source",
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![self.collection], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })
            .map_err(|e| AppError::Knowledge(format!("Failed to list sources: {}", e)))?;

        let mut summaries = Vec::new();
        for row in rows {
            let (source, file_type, chunks) =
                row.map_err(|e| AppError::Knowledge(format!("Failed to read source: {}", e)))?;
            let file_type = FileType::from_extension(&format!(".{}", file_type)).ok_or_else(
                || AppError::Knowledge(format!("Unknown file type '{}' for {}", file_type, source)),
            )?;
            summaries.push(SourceSummary {
                source,
                file_type,
                chunks: chunks as usize,
            });
        }

        Ok(summaries)
    }

    fn clear(&mut self) -> AppResult<()> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM documents WHERE collection = ?1",
                params![self.collection],
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to delete documents: {}", e)))?;

        tracing::info!(
            "Cleared collection '{}' ({} documents)",
            self.collection,
            removed
        );
        Ok(())
    }
}

/// Content-addressed id: `doc_` plus 16 hex chars of
/// sha256(source|page|chunk|content).
pub fn document_id(doc: &Document) -> String {
    let meta = &doc.metadata;
    let mut hasher = Sha256::new();
    hasher.update(meta.source.as_bytes());
    hasher.update(b"|");
    if let Some(page) = meta.page {
        hasher.update(page.to_string().as_bytes());
    }
    hasher.update(b"|");
    hasher.update(meta.chunk.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(doc.page_content.as_bytes());

    let digest = hasher.finalize();
    let hex: String = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();
    format!("doc_{}", hex)
}

fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
