//! Prompt assembly and answer generation over retrieved chunks.

use crate::rag::types::{Citation, RagAnswer};
use crate::types::Document;
use docchat_core::AppResult;
use docchat_llm::{ChatMessage, LlmClient, LlmRequest};
use docchat_prompt::{build_prompt, BuiltPrompt, PromptSet, ResponseMode};
use std::collections::HashSet;
use std::sync::Arc;

/// Maximum snippet length for citations, in characters.
const MAX_SNIPPET_CHARS: usize = 150;

const NO_CONTEXT: &str = "No relevant documents found.";

/// Format retrieved chunks as numbered, source-labelled context blocks.
pub fn build_context_string(docs: &[Document]) -> String {
    if docs.is_empty() {
        return NO_CONTEXT.to_string();
    }

    docs.iter()
        .enumerate()
        .map(|(i, doc)| {
            let meta = &doc.metadata;
            let mut location = format!("Source: {}", meta.source);
            if let Some(page) = meta.page {
                location.push_str(&format!(", Page {}", page));
            }
            location.push_str(&format!(", Chunk {}", meta.chunk));

            format!("[{}] {}\n{}", i + 1, location, doc.page_content)
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// One citation per distinct (source, page, chunk), in retrieval order.
pub fn extract_sources(docs: &[Document]) -> Vec<Citation> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for doc in docs {
        let meta = &doc.metadata;
        let key = format!(
            "{}-p{}-c{}",
            meta.source,
            meta.page.map(|p| p.to_string()).unwrap_or_default(),
            meta.chunk
        );

        if seen.insert(key) {
            sources.push(Citation {
                source: meta.source.clone(),
                file_type: meta.file_type,
                page: meta.page,
                chunk: Some(meta.chunk),
                snippet: snippet(&doc.page_content),
            });
        }
    }

    sources
}

fn snippet(text: &str) -> String {
    match text.char_indices().nth(MAX_SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Generates answers from retrieved chunks with a chat model.
#[derive(Clone)]
pub struct RagChain {
    llm: Arc<dyn LlmClient>,
    model: String,
    prompts: Arc<PromptSet>,
}

impl RagChain {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>, prompts: Arc<PromptSet>) -> Self {
        Self {
            llm,
            model: model.into(),
            prompts,
        }
    }

    pub fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the chat request for a question without sending it.
    pub fn build_request(
        &self,
        question: &str,
        docs: &[Document],
        history: &[ChatMessage],
        mode: ResponseMode,
    ) -> AppResult<(LlmRequest, BuiltPrompt)> {
        let context = build_context_string(docs);
        let built = build_prompt(self.prompts.get(mode), question, &context, history)?;

        let mut request = LlmRequest::new(built.messages.clone(), self.model.clone())
            .with_max_tokens(built.max_tokens)
            .with_temperature(built.temperature);
        if let Some(top_p) = built.top_p {
            request = request.with_top_p(top_p);
        }

        Ok((request, built))
    }

    /// Answer a question from retrieved chunks.
    ///
    /// A failed model call becomes an error message in `answer`; citations
    /// are returned either way.
    pub async fn generate_answer(
        &self,
        question: &str,
        docs: &[Document],
        history: &[ChatMessage],
        mode: ResponseMode,
    ) -> AppResult<RagAnswer> {
        let (request, built) = self.build_request(question, docs, history, mode)?;

        tracing::debug!(
            "Generating answer with {} (model: {}, mode: {}, {} chunks, {} history messages)",
            self.llm.provider_name(),
            self.model,
            mode,
            docs.len(),
            built.metadata.history_messages
        );

        let answer = match self.llm.complete(&request).await {
            Ok(response) => {
                tracing::debug!(
                    "Answer generated ({} tokens)",
                    response.usage.total_tokens
                );
                response.content
            }
            Err(e) => {
                tracing::error!("LLM request failed: {}", e);
                format!("❌ Error generating response: {}", e)
            }
        };

        Ok(RagAnswer {
            answer,
            sources: extract_sources(docs),
            mode,
        })
    }
}
