//! Clear command handler.

use clap::Args;
use docchat_core::{config::AppConfig, AppResult};
use docchat_knowledge::KnowledgeBase;

/// Remove every stored document
#[derive(Args, Debug)]
pub struct ClearCommand {}

impl ClearCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let knowledge = KnowledgeBase::open(config).await?;
        let removed = knowledge.count().await?;
        knowledge.clear().await?;

        tracing::info!("Removed {} chunks", removed);
        println!("Knowledge base cleared!");
        Ok(())
    }
}
