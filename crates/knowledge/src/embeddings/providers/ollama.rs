//! Ollama embedding provider.
//!
//! Local embeddings through Ollama's `/api/embeddings` endpoint (e.g.
//! `nomic-embed-text`, 768 dimensions). Ollama has no batch API, so texts
//! are embedded one request at a time.

use super::{with_retries, MAX_RETRIES, REQUEST_TIMEOUT_SECS};
use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use async_trait::async_trait;
use docchat_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Ollama embedding provider using the local API.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Create a provider and verify the model answers with the configured
    /// dimensions.
    ///
    /// # Errors
    /// * `AppError::Knowledge` - If Ollama is not reachable or the model is missing
    pub async fn new(config: &EmbeddingConfig) -> AppResult<Self> {
        let provider = Self::unverified(config)?;
        provider.verify_connection().await?;
        Ok(provider)
    }

    fn unverified(config: &EmbeddingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Knowledge(format!("Failed to create HTTP client for Ollama: {}", e))
            })?;

        let base_url = config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    #[instrument(skip(self), fields(model = %self.model))]
    async fn verify_connection(&self) -> AppResult<()> {
        debug!("Verifying Ollama connection at {}", self.base_url);

        match self.embed_with_retries("test connection").await {
            Ok(embedding) if embedding.len() != self.dimensions => {
                Err(AppError::Knowledge(format!(
                    "Ollama model '{}' returned {} dimensions, expected {}",
                    self.model,
                    embedding.len(),
                    self.dimensions
                )))
            }
            Ok(_) => {
                debug!("Ollama connection verified, model '{}' ready", self.model);
                Ok(())
            }
            Err(e) => {
                error!("Failed to connect to Ollama: {}", e);
                Err(AppError::Knowledge(format!(
                    "Ollama not available at {}. Ensure Ollama is running and model '{}' is installed. Run: ollama pull {}",
                    self.base_url, self.model, self.model
                )))
            }
        }
    }

    async fn embed_with_retries(&self, text: &str) -> AppResult<Vec<f32>> {
        with_retries(MAX_RETRIES, || self.embed_single(text)).await
    }

    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);

        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to send request to Ollama: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);

            return Err(AppError::Knowledge(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(body.embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "ollama", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for (i, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                warn!("Embedding empty text at index {} as a zero vector", i);
                embeddings.push(vec![0.0; self.dimensions]);
                continue;
            }

            let embedding = self.embed_with_retries(text).await?;
            if embedding.len() != self.dimensions {
                return Err(AppError::Knowledge(format!(
                    "Unexpected embedding dimensions: got {}, expected {}",
                    embedding.len(),
                    self.dimensions
                )));
            }
            embeddings.push(embedding);
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            endpoint: Some("http://localhost:11434/".to_string()),
            batch_size: 10,
        }
    }

    #[test]
    fn test_endpoint_is_normalized() {
        let provider = OllamaProvider::unverified(&test_config()).unwrap();
        assert_eq!(provider.base_url, "http://localhost:11434");
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.model_name(), "nomic-embed-text");
        assert_eq!(provider.dimensions(), 768);
    }

    #[tokio::test]
    async fn test_blank_texts_become_zero_vectors() {
        let provider = OllamaProvider::unverified(&test_config()).unwrap();
        let embeddings = provider
            .embed_batch(&["  ".to_string(), String::new()])
            .await
            .unwrap();

        assert_eq!(embeddings.len(), 2);
        assert!(embeddings.iter().all(|e| e.len() == 768));
        assert!(embeddings[0].iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_unreachable_server_fails() {
        let config = EmbeddingConfig {
            endpoint: Some("http://127.0.0.1:9".to_string()),
            ..test_config()
        };

        let err = OllamaProvider::new(&config).await.unwrap_err();
        assert!(err.to_string().contains("Ollama not available"));
    }
}
