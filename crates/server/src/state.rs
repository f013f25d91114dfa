//! Shared handler state.

use crate::session::SessionManager;
use docchat_core::{AppConfig, AppError, AppResult};
use docchat_knowledge::{KnowledgeBase, RagChain};
use docchat_llm::create_client;
use docchat_prompt::PromptSet;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub knowledge: Arc<KnowledgeBase>,
    pub chain: RagChain,
    pub sessions: Arc<RwLock<SessionManager>>,
    pub collection: String,
    /// Chunks retrieved per question
    pub top_k: usize,
}

impl AppState {
    pub fn new(
        knowledge: Arc<KnowledgeBase>,
        chain: RagChain,
        collection: impl Into<String>,
        top_k: usize,
    ) -> Self {
        Self {
            knowledge,
            chain,
            sessions: Arc::new(RwLock::new(SessionManager::new())),
            collection: collection.into(),
            top_k: top_k.max(1),
        }
    }

    /// Open the knowledge base and chat client described by the configuration.
    pub async fn from_config(config: &AppConfig) -> AppResult<Self> {
        let knowledge = KnowledgeBase::open(config).await?;

        let llm = create_client(
            &config.provider,
            config.endpoint.as_deref(),
            config.api_key.as_deref(),
        )
        .map_err(AppError::Llm)?;

        let prompts_dir = config.prompts_dir();
        let prompts = PromptSet::load(Some(&prompts_dir))?;
        let chain = RagChain::new(llm, config.model.clone(), Arc::new(prompts));

        Ok(Self::new(
            Arc::new(knowledge),
            chain,
            config.retrieval.collection.clone(),
            config.retrieval.top_k,
        ))
    }
}
