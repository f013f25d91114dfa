//! Hugging Face hosted feature-extraction embeddings.

use super::{check_dimensions, with_retries, MAX_RETRIES, REQUEST_TIMEOUT_SECS};
use crate::embeddings::{EmbeddingConfig, EmbeddingProvider};
use async_trait::async_trait;
use docchat_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_HF_INFERENCE_URL: &str = "https://router.huggingface.co/hf-inference/models";

/// Embeddings from the hosted Hugging Face inference router.
#[derive(Debug, Clone)]
pub struct HuggingFaceProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a [String],
}

/// Sentence-transformer pipelines return one pooled vector per input; raw
/// encoder models return one vector per token.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeatureExtractionResponse {
    Pooled(Vec<Vec<f32>>),
    PerToken(Vec<Vec<Vec<f32>>>),
}

impl FeatureExtractionResponse {
    fn into_vectors(self) -> Vec<Vec<f32>> {
        match self {
            Self::Pooled(vectors) => vectors,
            Self::PerToken(batches) => batches.into_iter().map(mean_pool).collect(),
        }
    }
}

fn mean_pool(tokens: Vec<Vec<f32>>) -> Vec<f32> {
    let Some(width) = tokens.first().map(Vec::len) else {
        return Vec::new();
    };

    let mut pooled = vec![0.0; width];
    for token in &tokens {
        for (acc, v) in pooled.iter_mut().zip(token) {
            *acc += v;
        }
    }

    let count = tokens.len() as f32;
    pooled.iter_mut().for_each(|v| *v /= count);
    pooled
}

impl HuggingFaceProvider {
    pub fn new(config: &EmbeddingConfig, api_key: &str) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                AppError::Knowledge(format!("Failed to create HTTP client for embeddings: {}", e))
            })?;

        let base_url = config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_HF_INFERENCE_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/{}/pipeline/feature-extraction",
            self.base_url, self.model
        )
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len()))]
    async fn request(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let url = self.url();
        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&FeatureExtractionRequest { inputs: texts })
            .send()
            .await
            .map_err(|e| AppError::Knowledge(format!("Hugging Face request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Knowledge(format!(
                "Hugging Face embedding error ({}): {}",
                status, body
            )));
        }

        let parsed: FeatureExtractionResponse = response.json().await.map_err(|e| {
            AppError::Knowledge(format!("Failed to parse Hugging Face embeddings: {}", e))
        })?;

        Ok(parsed.into_vectors())
    }
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceProvider {
    fn provider_name(&self) -> &str {
        "huggingface"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "huggingface", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = with_retries(MAX_RETRIES, || self.request(texts)).await?;

        if vectors.len() != texts.len() {
            return Err(AppError::Knowledge(format!(
                "Hugging Face returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        check_dimensions("Hugging Face", &vectors, self.dimensions)?;

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_layout() {
        let config = EmbeddingConfig::default();
        let provider = HuggingFaceProvider::new(&config, "hf_test").unwrap();
        assert_eq!(
            provider.url(),
            "https://router.huggingface.co/hf-inference/models/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction"
        );

        let custom = EmbeddingConfig {
            endpoint: Some("http://localhost:8080/models/".to_string()),
            ..config
        };
        let provider = HuggingFaceProvider::new(&custom, "hf_test").unwrap();
        assert!(provider.url().starts_with("http://localhost:8080/models/sentence"));
    }

    #[test]
    fn test_pooled_response() {
        let parsed: FeatureExtractionResponse =
            serde_json::from_str("[[0.1, 0.2], [0.3, 0.4]]").unwrap();
        assert_eq!(parsed.into_vectors(), vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[test]
    fn test_per_token_response_is_mean_pooled() {
        let parsed: FeatureExtractionResponse =
            serde_json::from_str("[[[1.0, 2.0], [3.0, 4.0]]]").unwrap();
        assert_eq!(parsed.into_vectors(), vec![vec![2.0, 3.0]]);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let provider =
            HuggingFaceProvider::new(&EmbeddingConfig::default(), "hf_test").unwrap();
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }
}
