//! Knowledge base facade: chunker, embedder and vector store together.

use crate::chunker::Chunker;
use crate::embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use crate::ingest::ingest_files;
use crate::store::SqliteStore;
use crate::types::{Document, EmbeddedDocument, IngestReport, ScoredDocument, SourceSummary, UploadedFile};
use crate::vector_index::VectorStore;
use docchat_core::{AppConfig, AppError, AppResult};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Instant;

const NO_TEXT_EXTRACTED: &str = "No text content could be extracted from the uploaded files.";

/// Embedding model details reported by stats endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingInfo {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
}

/// Document store with ingestion and semantic search.
///
/// Parsing, chunking and every store call run on the blocking thread pool.
/// The store mutex is only ever locked there.
pub struct KnowledgeBase {
    store: Arc<Mutex<Box<dyn VectorStore>>>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: Arc<Chunker>,
    batch_size: usize,
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("embedder", &self.embedder)
            .field("chunker", &self.chunker)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl KnowledgeBase {
    pub fn new(
        store: Box<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        chunker: Chunker,
        batch_size: usize,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            embedder,
            chunker: Arc::new(chunker),
            batch_size: batch_size.max(1),
        }
    }

    /// Open the workspace store described by the configuration.
    pub async fn open(config: &AppConfig) -> AppResult<Self> {
        let embedding = EmbeddingConfig::from(&config.embedding);
        let embedder = create_provider(&embedding, config.api_key.as_deref()).await?;
        let chunker = Chunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;

        config.ensure_data_dir()?;
        let store = SqliteStore::open(
            &config.store_path(),
            &config.retrieval.collection,
            &embedding,
        )?;

        tracing::info!(
            "Opened knowledge base at {:?} (collection '{}', {} / {})",
            config.store_path(),
            store.collection(),
            embedder.provider_name(),
            embedder.model_name()
        );

        Ok(Self::new(
            Box::new(store),
            embedder,
            chunker,
            embedding.batch_size,
        ))
    }

    /// Parse, chunk, embed and store uploaded files.
    ///
    /// # Errors
    /// `AppError::UnsupportedFile` or `AppError::Ingest` for the first file
    /// that cannot be read, and `AppError::Ingest` when no file yields text.
    pub async fn ingest(&self, files: Vec<UploadedFile>) -> AppResult<IngestReport> {
        let start = Instant::now();
        let file_count = files.len();
        let file_names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();

        let chunker = Arc::clone(&self.chunker);
        let documents =
            run_blocking("Document parsing", move || ingest_files(&files, &chunker)).await?;

        if documents.is_empty() {
            return Err(AppError::Ingest(NO_TEXT_EXTRACTED.to_string()));
        }

        let chunks = self.add_documents(documents).await?;
        let report = IngestReport {
            files: file_count,
            chunks,
            file_names,
        };

        tracing::info!(
            "Ingested {} files into {} chunks in {:.2}s",
            report.files,
            report.chunks,
            start.elapsed().as_secs_f64()
        );

        Ok(report)
    }

    /// Embed documents in batches and store them.
    pub async fn add_documents(&self, documents: Vec<Document>) -> AppResult<usize> {
        let mut embedded = Vec::with_capacity(documents.len());

        for batch in documents.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|d| d.page_content.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;

            if vectors.len() != batch.len() {
                return Err(AppError::Knowledge(format!(
                    "Embedding provider returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                )));
            }

            embedded.extend(batch.iter().cloned().zip(vectors).map(|(document, embedding)| {
                EmbeddedDocument {
                    document,
                    embedding,
                }
            }));
        }

        self.with_store(move |store| {
            let written = store.add_documents(&embedded)?;
            store.flush()?;
            Ok(written)
        })
        .await
    }

    /// Retrieve the `k` chunks most similar to a question.
    pub async fn search(&self, question: &str, k: usize) -> AppResult<Vec<ScoredDocument>> {
        if self.count().await? == 0 {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(question).await?;
        let results = self.with_store(move |store| store.search(&query, k)).await?;

        tracing::debug!(
            "Search returned {} chunks for question ({} chars)",
            results.len(),
            question.chars().count()
        );

        Ok(results)
    }

    pub async fn count(&self) -> AppResult<usize> {
        self.with_store(|store| store.count()).await
    }

    pub async fn sources(&self) -> AppResult<Vec<SourceSummary>> {
        self.with_store(|store| store.sources()).await
    }

    pub async fn clear(&self) -> AppResult<()> {
        self.with_store(|store| {
            store.clear()?;
            store.flush()
        })
        .await
    }

    pub fn embedding_info(&self) -> EmbeddingInfo {
        EmbeddingInfo {
            provider: self.embedder.provider_name().to_string(),
            model: self.embedder.model_name().to_string(),
            dimensions: self.embedder.dimensions(),
        }
    }

    /// Run `f` against the locked store on the blocking thread pool.
    async fn with_store<T, F>(&self, f: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn VectorStore) -> AppResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        run_blocking("Vector store", move || {
            let mut guard = store
                .lock()
                .map_err(|_| AppError::Knowledge("Vector store lock poisoned".to_string()))?;
            f(&mut **guard)
        })
        .await
    }
}

async fn run_blocking<T, F>(what: &'static str, f: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Knowledge(format!("{} task failed: {}", what, e)))?
}
