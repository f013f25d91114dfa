//! Ask command handler.
//!
//! Retrieves the most relevant chunks for a question and answers it with
//! the configured chat model, printing the answer followed by its sources.

use clap::Args;
use docchat_core::{config::AppConfig, AppError, AppResult};
use docchat_knowledge::{extract_sources, Citation, Document, KnowledgeBase, RagAnswer, RagChain};
use docchat_llm::{create_client, LlmUsage};
use docchat_prompt::{PromptSet, ResponseMode};
use futures::StreamExt;
use std::io::Write;
use std::sync::Arc;

/// Ask a one-off question about the stored documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Response mode (strict, hybrid)
    #[arg(long, default_value = "strict")]
    pub mode: ResponseMode,

    /// Number of chunks to retrieve (default from config)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Stream tokens as they arrive (default)
    #[arg(long, overrides_with = "no_stream")]
    pub stream: bool,

    /// Wait for the full answer before printing
    #[arg(long, overrides_with = "stream")]
    pub no_stream: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        config.validate()?;

        let question = self.question.trim();
        if question.is_empty() {
            return Err(AppError::Config("No question provided".to_string()));
        }

        let knowledge = KnowledgeBase::open(config).await?;
        if knowledge.count().await? == 0 {
            return Err(AppError::Knowledge(
                "Please upload and process documents first (docchat ingest <files>)".to_string(),
            ));
        }

        let top_k = self.top_k.unwrap_or(config.retrieval.top_k).max(1);
        let docs: Vec<Document> = knowledge
            .search(question, top_k)
            .await?
            .into_iter()
            .map(|scored| scored.document)
            .collect();
        tracing::info!("Retrieved {} chunks (mode: {})", docs.len(), self.mode);

        let llm = create_client(
            &config.provider,
            config.endpoint.as_deref(),
            config.api_key.as_deref(),
        )
        .map_err(AppError::Llm)?;
        let prompts = PromptSet::load(Some(&config.prompts_dir()))?;
        let chain = RagChain::new(llm, config.model.clone(), Arc::new(prompts));

        if self.is_streaming() && !self.json {
            return self.stream_answer(&chain, question, &docs).await;
        }

        let answer = chain.generate_answer(question, &docs, &[], self.mode).await?;

        if self.json {
            let output = serde_json::json!({
                "answer": answer.answer,
                "sources": answer.sources,
                "mode": answer.mode,
                "model": chain.model(),
                "provider": config.provider,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_answer(&answer);
        }

        Ok(())
    }

    /// Print tokens as they arrive, then the sources.
    async fn stream_answer(
        &self,
        chain: &RagChain,
        question: &str,
        docs: &[Document],
    ) -> AppResult<()> {
        let (request, _) = chain.build_request(question, docs, &[], self.mode)?;
        let request = request.with_streaming();
        let mut stream = chain.llm().stream(&request).await?;
        let mut usage: Option<LlmUsage> = None;
        let mut stdout = std::io::stdout();

        while let Some(result) = stream.next().await {
            let chunk = result?;

            if !chunk.content.is_empty() {
                print!("{}", chunk.content);
                stdout.flush().ok();
            }

            if chunk.done {
                usage = chunk.usage;
                break;
            }
        }
        println!();

        if let Some(usage) = usage {
            tracing::debug!(
                "Token usage - Prompt: {}, Completion: {}, Total: {}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }

        print_sources(&extract_sources(docs));
        Ok(())
    }

    pub fn is_streaming(&self) -> bool {
        self.stream || !self.no_stream
    }
}

fn print_answer(answer: &RagAnswer) {
    println!("{}", answer.answer);
    print_sources(&answer.sources);
}

fn print_sources(sources: &[Citation]) {
    if sources.is_empty() {
        return;
    }

    println!("\n📎 Sources ({} references)", sources.len());
    for (i, source) in sources.iter().enumerate() {
        let mut location = source.source.clone();
        if let Some(page) = source.page {
            location.push_str(&format!(", Page {}", page));
        }
        if let Some(chunk) = source.chunk {
            location.push_str(&format!(", Chunk {}", chunk));
        }

        println!("  [{}] {}", i + 1, location);
        println!("      {}", source.snippet.replace('\n', " "));
    }
}
