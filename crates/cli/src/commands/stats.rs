//! Stats command handler.

use clap::Args;
use docchat_core::{config::AppConfig, AppResult};
use docchat_knowledge::KnowledgeBase;

/// Show knowledge base statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let knowledge = KnowledgeBase::open(config).await?;
        let chunks = knowledge.count().await?;
        let sources = knowledge.sources().await?;
        let embedding = knowledge.embedding_info();

        if self.json {
            let output = serde_json::json!({
                "chunks": chunks,
                "collection": config.retrieval.collection,
                "embedding": embedding,
                "sources": sources,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("Collection: {}", config.retrieval.collection);
        println!(
            "Embeddings: {} / {} ({} dimensions)",
            embedding.provider, embedding.model, embedding.dimensions
        );
        println!("Chunks:     {}", chunks);

        if sources.is_empty() {
            println!("\nNo documents loaded. Use 'docchat ingest <files>' to add some.");
        } else {
            println!("\nLoaded documents:");
            for source in &sources {
                println!(
                    "  📄 {} ({}, {} chunks)",
                    source.source, source.file_type, source.chunks
                );
            }
        }

        Ok(())
    }
}
