//! End-to-end ingestion and retrieval through the knowledge base facade.

use super::StubLlm;
use crate::embeddings::providers::TrigramProvider;
use crate::embeddings::EmbeddingConfig;
use crate::parser::test_support::docx_bytes;
use crate::rag::RagChain;
use crate::{EmbeddedDocument, FileType, ScoredDocument, SourceSummary, UploadedFile};
use crate::{Chunker, KnowledgeBase, SqliteStore, VectorStore};
use docchat_core::{AppError, AppResult};
use docchat_prompt::{PromptSet, ResponseMode};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

fn knowledge_base() -> KnowledgeBase {
    let store = SqliteStore::open_in_memory("test", &EmbeddingConfig::trigram(256)).unwrap();
    KnowledgeBase::new(
        Box::new(store),
        Arc::new(TrigramProvider::new(256)),
        Chunker::default(),
        2,
    )
}

fn inventory_csv() -> UploadedFile {
    UploadedFile::new(
        "inventory.csv",
        "product,warehouse,stock\nWidget,Berlin,40\nGadget,Lisbon,0\nSprocket,Oslo,12\n",
    )
}

fn policy_docx() -> UploadedFile {
    let body = "<w:p><w:r><w:t>Refund policy: customers may return items within thirty days for a full refund.</w:t></w:r></w:p>\
                <w:p><w:r><w:t>Shipping policy: orders ship from the nearest warehouse.</w:t></w:r></w:p>";
    UploadedFile::new("policy.docx", docx_bytes(body))
}

#[tokio::test]
async fn test_ingest_reports_files_and_chunks() {
    let kb = knowledge_base();
    let report = kb.ingest(vec![inventory_csv(), policy_docx()]).await.unwrap();

    assert_eq!(report.files, 2);
    assert_eq!(report.chunks, 2);
    assert_eq!(report.file_names, vec!["inventory.csv", "policy.docx"]);
    assert_eq!(kb.count().await.unwrap(), 2);

    let sources = kb.sources().await.unwrap();
    assert_eq!(sources[0].source, "inventory.csv");
    assert_eq!(sources[1].file_type, FileType::Docx);
}

#[tokio::test]
async fn test_reingesting_same_file_does_not_duplicate() {
    let kb = knowledge_base();
    kb.ingest(vec![inventory_csv()]).await.unwrap();
    kb.ingest(vec![inventory_csv()]).await.unwrap();
    assert_eq!(kb.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_empty_upload_is_rejected() {
    let kb = knowledge_base();
    let empty = UploadedFile::new("blank.docx", docx_bytes("<w:p/>"));

    let err = kb.ingest(vec![empty]).await.unwrap_err();
    assert!(matches!(err, AppError::Ingest(_)));
    assert!(err
        .to_string()
        .contains("No text content could be extracted from the uploaded files."));
    assert_eq!(kb.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_unsupported_upload_stores_nothing() {
    let kb = knowledge_base();
    let err = kb
        .ingest(vec![inventory_csv(), UploadedFile::new("slides.pptx", "x")])
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::UnsupportedFile(_)));
    assert_eq!(kb.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_search_ranks_relevant_chunk_first() {
    let kb = knowledge_base();
    kb.ingest(vec![inventory_csv(), policy_docx()]).await.unwrap();

    let results = kb.search("refund policy return items", 5).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].document.metadata.source, "policy.docx");
    assert!(results[0].score > results[1].score);
}

#[tokio::test]
async fn test_search_empty_store() {
    let kb = knowledge_base();
    assert!(kb.search("anything", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clear() {
    let kb = knowledge_base();
    kb.ingest(vec![inventory_csv()]).await.unwrap();
    kb.clear().await.unwrap();
    assert_eq!(kb.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_question_to_answer() {
    let kb = knowledge_base();
    kb.ingest(vec![inventory_csv(), policy_docx()]).await.unwrap();

    let llm = Arc::new(StubLlm::answering("Gadget is out of stock."));
    let chain = RagChain::new(llm.clone(), "test-model", Arc::new(PromptSet::builtin().unwrap()));

    let docs: Vec<_> = kb
        .search("Which product has zero stock?", 5)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.document)
        .collect();
    let answer = chain
        .generate_answer("Which product has zero stock?", &docs, &[], ResponseMode::Strict)
        .await
        .unwrap();

    assert_eq!(answer.answer, "Gadget is out of stock.");
    assert_eq!(answer.sources.len(), 2);

    let prompt = &llm.requests()[0].messages[1].content;
    assert!(prompt.contains("product: Gadget | warehouse: Lisbon | stock: 0"));
    assert!(prompt.contains("Question: Which product has zero stock?"));
}

/// Store that records which thread each call runs on.
struct ThreadRecordingStore {
    threads: Arc<Mutex<Vec<ThreadId>>>,
}

impl ThreadRecordingStore {
    fn record(&self) {
        self.threads.lock().unwrap().push(thread::current().id());
    }
}

impl VectorStore for ThreadRecordingStore {
    fn add_documents(&mut self, documents: &[EmbeddedDocument]) -> AppResult<usize> {
        self.record();
        Ok(documents.len())
    }

    fn search(&self, _query_embedding: &[f32], _k: usize) -> AppResult<Vec<ScoredDocument>> {
        self.record();
        Ok(Vec::new())
    }

    fn count(&self) -> AppResult<usize> {
        self.record();
        Ok(1)
    }

    fn sources(&self) -> AppResult<Vec<SourceSummary>> {
        self.record();
        Ok(Vec::new())
    }

    fn clear(&mut self) -> AppResult<()> {
        self.record();
        Ok(())
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_store_calls_run_off_the_runtime_thread() {
    let threads = Arc::new(Mutex::new(Vec::new()));
    let kb = KnowledgeBase::new(
        Box::new(ThreadRecordingStore {
            threads: Arc::clone(&threads),
        }),
        Arc::new(TrigramProvider::new(64)),
        Chunker::default(),
        2,
    );

    kb.ingest(vec![inventory_csv()]).await.unwrap();
    kb.search("widget stock", 3).await.unwrap();
    kb.sources().await.unwrap();
    kb.clear().await.unwrap();

    let runtime_thread = thread::current().id();
    let threads = threads.lock().unwrap();
    // add, count, search, sources, clear
    assert_eq!(threads.len(), 5);
    assert!(threads.iter().all(|id| *id != runtime_thread));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_reads_share_the_store() {
    let kb = Arc::new(knowledge_base());
    kb.ingest(vec![inventory_csv(), policy_docx()]).await.unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let kb = Arc::clone(&kb);
            tokio::spawn(async move {
                if i % 2 == 0 {
                    kb.search("refund policy", 2).await.map(|hits| hits.len())
                } else {
                    kb.count().await
                }
            })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().unwrap() > 0);
    }
}
