//! Hugging Face chat-completion provider.
//!
//! Talks to the Inference Providers router, which exposes an
//! OpenAI-compatible `/chat/completions` endpoint authenticated with a
//! Hugging Face access token.

use super::{drain_lines, error_message};
use crate::client::{
    ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage,
};
use docchat_core::{AppError, AppResult};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

/// Default router base URL.
pub const DEFAULT_HF_URL: &str = "https://router.huggingface.co/v1";

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<LlmUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    usage: Option<LlmUsage>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Hugging Face chat client.
pub struct HuggingFaceClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HuggingFaceClient {
    /// Create a client against the public router.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_HF_URL, api_key)
    }

    /// Create a client against a custom OpenAI-compatible base URL.
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    fn to_wire_request<'a>(&self, request: &'a LlmRequest, stream: bool) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
            stream,
        }
    }

    fn convert_response(&self, response: ChatCompletionResponse) -> AppResult<LlmResponse> {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::Llm("Hugging Face response contained no choices".to_string()))?;

        Ok(LlmResponse {
            content,
            model: response.model,
            usage: response.usage.unwrap_or_default(),
            done: true,
        })
    }

    async fn post(&self, body: &ChatCompletionRequest<'_>) -> AppResult<reqwest::Response> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Hugging Face: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Hugging Face API error ({}): {}",
                status,
                error_message(&error_text)
            )));
        }

        Ok(response)
    }
}

/// Parse one server-sent-event line. `None` for comments and keep-alives.
fn parse_sse_line(line: &str, model: &str) -> Option<AppResult<LlmStreamChunk>> {
    let data = line.strip_prefix("data:")?.trim();

    if data == "[DONE]" {
        return Some(Ok(LlmStreamChunk {
            content: String::new(),
            model: model.to_string(),
            done: true,
            usage: None,
        }));
    }

    let chunk: ChatCompletionChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => return Some(Err(AppError::Llm(format!("Failed to parse chunk: {}", e)))),
    };

    let first = chunk.choices.into_iter().next();
    let done = first
        .as_ref()
        .map(|c| c.finish_reason.is_some())
        .unwrap_or(false);
    let content = first.and_then(|c| c.delta.content).unwrap_or_default();

    Some(Ok(LlmStreamChunk {
        content,
        model: if chunk.model.is_empty() { model.to_string() } else { chunk.model },
        done,
        usage: chunk.usage,
    }))
}

#[async_trait::async_trait]
impl LlmClient for HuggingFaceClient {
    fn provider_name(&self) -> &str {
        "huggingface"
    }

    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending chat completion to Hugging Face");

        let body = self.to_wire_request(request, false);
        let response = self.post(&body).await?;

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Hugging Face response: {}", e)))?;

        let result = self.convert_response(parsed)?;
        tracing::debug!(
            "Hugging Face usage: prompt={}, completion={}",
            result.usage.prompt_tokens,
            result.usage.completion_tokens
        );
        Ok(result)
    }

    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        tracing::info!("Starting streaming chat completion with Hugging Face");

        let body = self.to_wire_request(request, true);
        let response = self.post(&body).await?;
        let model = request.model.clone();

        let stream = response
            .bytes_stream()
            .scan(Vec::new(), move |buffer, result| {
                let items: Vec<AppResult<LlmStreamChunk>> = match result {
                    Ok(bytes) => drain_lines(buffer, &bytes)
                        .iter()
                        .filter_map(|line| parse_sse_line(line, &model))
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
    fn test_client_creation() {
        let client = HuggingFaceClient::with_base_url("https://example.test/v1/", "hf_x");
        assert_eq!(client.provider_name(), "huggingface");
        assert_eq!(client.base_url, "https://example.test/v1");
    }

    #[test]
    fn test_wire_request_shape() {
        let client = HuggingFaceClient::new("hf_x");
        let request = LlmRequest::new(
            vec![ChatMessage::system("rules"), ChatMessage::user("question")],
            "meta-llama/Llama-3.2-3B-Instruct",
        )
        .with_max_tokens(1024)
        .with_temperature(0.3);

        let json = serde_json::to_value(client.to_wire_request(&request, false)).unwrap();
        assert_eq!(json["model"], "meta-llama/Llama-3.2-3B-Instruct");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "question");
        assert_eq!(json["max_tokens"], 1024);
        assert_eq!(json["stream"], false);
        assert!(json.get("top_p").is_none());
    }

    #[test]
    fn test_convert_response() {
        let client = HuggingFaceClient::new("hf_x");
        let parsed: ChatCompletionResponse = serde_json::from_str(
            r#"{"model":"m","choices":[{"index":0,"message":{"role":"assistant","content":"Answer"},"finish_reason":"stop"}],
                "usage":{"prompt_tokens":10,"completion_tokens":5,"total_tokens":15}}"#,
        )
        .unwrap();

        let response = client.convert_response(parsed).unwrap();
        assert_eq!(response.content, "Answer");
        assert_eq!(response.usage.total_tokens, 15);
    }

    #[test]
    fn test_convert_response_without_choices() {
        let client = HuggingFaceClient::new("hf_x");
        let parsed: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(client.convert_response(parsed).is_err());
    }

    #[test]
    fn test_parse_sse_lines() {
        let chunk = parse_sse_line(
            r#"data: {"model":"m","choices":[{"index":0,"delta":{"content":"Hel"}}]}"#,
            "fallback",
        )
        .unwrap()
        .unwrap();
        assert_eq!(chunk.content, "Hel");
        assert!(!chunk.done);

        let last = parse_sse_line(
            r#"data: {"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
            "fallback",
        )
        .unwrap()
        .unwrap();
        assert!(last.done);
        assert_eq!(last.model, "fallback");

        let done = parse_sse_line("data: [DONE]", "m").unwrap().unwrap();
        assert!(done.done);

        assert!(parse_sse_line(": keep-alive", "m").is_none());
        assert!(parse_sse_line("data: {oops", "m").unwrap().is_err());
    }
}
