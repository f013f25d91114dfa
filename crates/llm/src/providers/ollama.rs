//! Ollama chat provider.
//!
//! Integration with a local Ollama runtime through `/api/chat`.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use super::{drain_lines, error_message};
use crate::client::{
    ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage,
};
use docchat_core::{AppError, AppResult};
use futures::StreamExt;
use serde::{Deserialize, Serialize};

/// Default local Ollama URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama `/api/chat` request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Default, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

/// Ollama `/api/chat` response (also one line of a stream).
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    model: String,
    #[serde(default)]
    message: Option<OllamaMessage>,
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

impl OllamaChatResponse {
    fn usage(&self) -> LlmUsage {
        LlmUsage::new(
            self.prompt_eval_count.unwrap_or(0),
            self.eval_count.unwrap_or(0),
        )
    }

    fn into_stream_chunk(self) -> LlmStreamChunk {
        let usage = self.done.then(|| self.usage());
        LlmStreamChunk {
            content: self.message.map(|m| m.content).unwrap_or_default(),
            model: self.model,
            done: self.done,
            usage,
        }
    }
}

/// Ollama chat client.
pub struct OllamaClient {
    /// Base URL for Ollama API
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client against `http://localhost:11434`.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_OLLAMA_URL)
    }

    /// Create a new Ollama client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn to_ollama_request(&self, request: &LlmRequest, stream: bool) -> OllamaChatRequest {
        OllamaChatRequest {
            model: request.model.clone(),
            messages: request.messages.clone(),
            stream,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
                top_p: request.top_p,
            },
        }
    }

    fn convert_response(&self, response: OllamaChatResponse) -> LlmResponse {
        let usage = response.usage();
        LlmResponse {
            content: response.message.map(|m| m.content).unwrap_or_default(),
            model: response.model,
            usage,
            done: response.done,
        }
    }

    async fn post(&self, body: &OllamaChatRequest) -> AppResult<reqwest::Response> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status,
                error_message(&error_text)
            )));
        }

        Ok(response)
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending chat request to Ollama");
        tracing::debug!("Request: {:?}", request);

        let body = self.to_ollama_request(request, false);
        let response = self.post(&body).await?;

        let ollama_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Ollama response: {}", e)))?;

        tracing::info!("Received chat response from Ollama");
        Ok(self.convert_response(ollama_response))
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::info!("Starting streaming chat request to Ollama");

        let body = self.to_ollama_request(request, true);
        let response = self.post(&body).await?;

        // Newline-delimited JSON, one object per line
        let stream = response
            .bytes_stream()
            .scan(Vec::new(), |buffer, result| {
                let items: Vec<AppResult<LlmStreamChunk>> = match result {
                    Ok(bytes) => drain_lines(buffer, &bytes)
                        .iter()
                        .map(|line| {
                            serde_json::from_str::<OllamaChatResponse>(line)
                                .map(OllamaChatResponse::into_stream_chunk)
                                .map_err(|e| AppError::Llm(format!("Failed to parse chunk: {}", e)))
                        })
                        .collect(),
                    Err(e) => vec![Err(AppError::Llm(format!("Stream error: {}", e)))],
                };
                futures::future::ready(Some(futures::stream::iter(items)))
            })
            .flatten();

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_client_creation() {
        let client = OllamaClient::new();
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_ollama_request_conversion() {
        let client = OllamaClient::new();
        let request = LlmRequest::new(vec![ChatMessage::user("Hello")], "llama3.2")
            .with_temperature(0.5)
            .with_max_tokens(1024);

        let ollama_req = client.to_ollama_request(&request, false);
        assert_eq!(ollama_req.model, "llama3.2");
        assert_eq!(ollama_req.messages[0].content, "Hello");
        assert_eq!(ollama_req.options.temperature, Some(0.5));
        assert_eq!(ollama_req.options.num_predict, Some(1024));
        assert!(!ollama_req.stream);
    }

    #[test]
    fn test_stream_line_conversion() {
        let partial: OllamaChatResponse = serde_json::from_str(
            r#"{"model":"llama3.2","message":{"role":"assistant","content":"Hi"},"done":false}"#,
        )
        .unwrap();
        let chunk = partial.into_stream_chunk();
        assert_eq!(chunk.content, "Hi");
        assert!(chunk.usage.is_none());

        let last: OllamaChatResponse = serde_json::from_str(
            r#"{"model":"llama3.2","message":{"role":"assistant","content":""},"done":true,"prompt_eval_count":7,"eval_count":3}"#,
        )
        .unwrap();
        let chunk = last.into_stream_chunk();
        assert!(chunk.done);
        assert_eq!(chunk.usage, Some(LlmUsage::new(7, 3)));
    }
}
