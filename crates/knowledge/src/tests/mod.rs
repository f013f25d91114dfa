//! Shared test fixtures.

mod pipeline;

use crate::types::{Document, DocumentMetadata, FileType};
use async_trait::async_trait;
use docchat_core::{AppError, AppResult};
use docchat_llm::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use std::sync::Mutex;

/// Chat client that records requests and replies with a fixed answer.
pub(crate) struct StubLlm {
    reply: Result<String, String>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl StubLlm {
    pub fn answering(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for StubLlm {
    fn provider_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Ok(content) => Ok(LlmResponse {
                content: content.clone(),
                model: request.model.clone(),
                usage: LlmUsage::new(10, 5),
                done: true,
            }),
            Err(message) => Err(AppError::Llm(message.clone())),
        }
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        let response = self.complete(request).await?;
        let chunk = LlmStreamChunk {
            content: response.content,
            model: response.model,
            done: true,
            usage: Some(response.usage),
        };
        Ok(Box::pin(futures::stream::iter(vec![Ok(chunk)])))
    }
}

pub(crate) fn pdf_doc(source: &str, page: u32, chunk: u32, content: &str) -> Document {
    Document::new(
        content,
        DocumentMetadata {
            source: source.to_string(),
            page: Some(page),
            chunk,
            file_type: FileType::Pdf,
            columns: None,
        },
    )
}
