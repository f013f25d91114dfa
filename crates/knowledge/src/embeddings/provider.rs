//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{HuggingFaceProvider, OllamaProvider, TrigramProvider};
use docchat_core::config::normalize_provider;
use docchat_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "huggingface", "ollama", "trigram")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Knowledge("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
///
/// Ollama verifies the connection during construction, hence `async`.
pub async fn create_provider(
    config: &EmbeddingConfig,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    tracing::debug!(
        "Creating embedding provider: provider={}, model={}, dimensions={}",
        config.provider,
        config.model,
        config.dimensions
    );

    match normalize_provider(&config.provider).as_str() {
        "huggingface" => {
            let api_key = api_key.filter(|k| !k.is_empty()).ok_or_else(|| {
                AppError::Config(
                    "Hugging Face embeddings require an API token (set HUGGINGFACEHUB_API_TOKEN)"
                        .to_string(),
                )
            })?;
            let provider = HuggingFaceProvider::new(config, api_key)?;
            Ok(Arc::new(provider))
        }

        "ollama" => {
            let provider = OllamaProvider::new(config).await?;
            Ok(Arc::new(provider))
        }

        "trigram" => Ok(Arc::new(TrigramProvider::new(config.dimensions))),

        _ => Err(AppError::Knowledge(format!(
            "Unknown embedding provider: '{}'. Supported providers: huggingface, ollama, trigram",
            config.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_trigram_provider() {
        let config = EmbeddingConfig::trigram(384);

        let provider = create_provider(&config, None).await.unwrap();
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
        assert_eq!(provider.dimensions(), 384);
    }

    #[tokio::test]
    async fn test_provider_name_is_case_insensitive() {
        let config = EmbeddingConfig {
            provider: "Trigram".to_string(),
            ..EmbeddingConfig::trigram(32)
        };
        let provider = create_provider(&config, None).await.unwrap();
        assert_eq!(provider.provider_name(), "trigram");

        let config = EmbeddingConfig {
            provider: "HF".to_string(),
            ..EmbeddingConfig::default()
        };
        let provider = create_provider(&config, Some("hf_test")).await.unwrap();
        assert_eq!(provider.provider_name(), "huggingface");
    }

    #[tokio::test]
    async fn test_create_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "unknown".to_string(),
            ..EmbeddingConfig::default()
        };

        let result = create_provider(&config, None).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_huggingface_requires_token() {
        let config = EmbeddingConfig::default();

        let err = create_provider(&config, None).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let provider = create_provider(&config, Some("hf_test")).await.unwrap();
        assert_eq!(provider.provider_name(), "huggingface");
        assert_eq!(provider.dimensions(), 384);
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider(&EmbeddingConfig::trigram(64), None)
            .await
            .unwrap();

        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 64);
    }
}
