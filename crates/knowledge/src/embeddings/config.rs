//! Embedding configuration types.

use docchat_core::config::{normalize_provider, EmbeddingSettings};
use docchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Embedding configuration for a collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "huggingface", "ollama", "trigram"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Custom endpoint base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Maximum batch size for embedding requests
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    100
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "huggingface".to_string(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
            endpoint: None,
            batch_size: default_batch_size(),
        }
    }
}

impl EmbeddingConfig {
    /// Offline configuration backed by the trigram provider.
    pub fn trigram(dimensions: usize) -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions,
            endpoint: None,
            batch_size: default_batch_size(),
        }
    }

    /// Validate that another config is consistent with this one.
    pub fn validate_consistency(&self, other: &Self) -> AppResult<()> {
        if self.provider != other.provider {
            return Err(AppError::Knowledge(format!(
                "Provider mismatch: expected '{}', got '{}'",
                self.provider, other.provider
            )));
        }

        if self.model != other.model {
            return Err(AppError::Knowledge(format!(
                "Model mismatch: expected '{}', got '{}'",
                self.model, other.model
            )));
        }

        if self.dimensions != other.dimensions {
            return Err(AppError::Knowledge(format!(
                "Dimension mismatch: expected {}, got {}",
                self.dimensions, other.dimensions
            )));
        }

        Ok(())
    }
}

impl From<&EmbeddingSettings> for EmbeddingConfig {
    fn from(settings: &EmbeddingSettings) -> Self {
        Self {
            provider: normalize_provider(&settings.provider),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            endpoint: settings.endpoint.clone(),
            batch_size: settings.batch_size.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "huggingface");
        assert_eq!(config.model, "sentence-transformers/all-MiniLM-L6-v2");
        assert_eq!(config.dimensions, 384);
        assert_eq!(config.batch_size, 100);
    }

    #[test]
    fn test_from_settings() {
        let settings = EmbeddingSettings {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            endpoint: Some("http://gpu-box:11434".to_string()),
            batch_size: 0,
        };

        let config = EmbeddingConfig::from(&settings);
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.dimensions, 768);
        assert_eq!(config.endpoint.as_deref(), Some("http://gpu-box:11434"));
        assert_eq!(config.batch_size, 1);
    }

    #[test]
    fn test_from_settings_normalizes_provider() {
        let settings = EmbeddingSettings {
            provider: "HF".to_string(),
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
            endpoint: None,
            batch_size: 32,
        };

        let config = EmbeddingConfig::from(&settings);
        assert_eq!(config.provider, "huggingface");
        assert!(config
            .validate_consistency(&EmbeddingConfig::default())
            .is_ok());
    }

    #[test]
    fn test_validate_consistency_success() {
        let config = EmbeddingConfig::trigram(384);
        assert!(config.validate_consistency(&config.clone()).is_ok());
    }

    #[test]
    fn test_validate_consistency_provider_mismatch() {
        let config1 = EmbeddingConfig::default();
        let config2 = EmbeddingConfig::trigram(384);

        let result = config1.validate_consistency(&config2);
        assert!(result.unwrap_err().to_string().contains("Provider mismatch"));
    }

    #[test]
    fn test_validate_consistency_dimension_mismatch() {
        let config1 = EmbeddingConfig::default();
        let config2 = EmbeddingConfig {
            dimensions: 768,
            ..config1.clone()
        };

        let result = config1.validate_consistency(&config2);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Dimension mismatch"));
    }
}
