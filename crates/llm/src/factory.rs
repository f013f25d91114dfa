//! LLM provider factory.

use crate::client::LlmClient;
use crate::providers::{HuggingFaceClient, OllamaClient};
use crate::types::ProviderType;
use std::sync::Arc;

/// Create a chat client for the named provider.
///
/// # Arguments
/// * `provider` - Provider identifier ("huggingface", "hf", "ollama")
/// * `endpoint` - Optional custom base URL
/// * `api_key` - API key, required by hosted providers
///
/// # Errors
/// Returns a message if the provider is unknown or a required key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> Result<Arc<dyn LlmClient>, String> {
    let provider_type =
        ProviderType::parse(provider).ok_or_else(|| format!("Unknown provider: {}", provider))?;

    let api_key = api_key.filter(|k| !k.is_empty());
    if provider_type.requires_api_key() && api_key.is_none() {
        return Err(format!("{} provider requires API key", provider_type.as_str()));
    }

    match provider_type {
        ProviderType::HuggingFace => {
            let api_key = api_key.unwrap_or_default();
            let client = match endpoint {
                Some(base_url) => HuggingFaceClient::with_base_url(base_url, api_key),
                None => HuggingFaceClient::new(api_key),
            };
            tracing::debug!("Created Hugging Face chat client");
            Ok(Arc::new(client))
        }
        ProviderType::Ollama => {
            let client = match endpoint {
                Some(base_url) => OllamaClient::with_base_url(base_url),
                None => OllamaClient::new(),
            };
            tracing::debug!("Created Ollama chat client");
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client("ollama", Some("http://localhost:8080"), None);
        assert!(client.is_ok());
    }

    #[test]
    fn test_create_huggingface_client() {
        let client = create_client("hf", None, Some("hf_token")).unwrap();
        assert_eq!(client.provider_name(), "huggingface");
    }

    #[test]
    fn test_huggingface_requires_api_key() {
        match create_client("huggingface", None, None) {
            Err(err) => assert!(err.contains("requires API key")),
            Ok(_) => panic!("Expected error for Hugging Face without API key"),
        }
        assert!(create_client("huggingface", None, Some("")).is_err());
    }

    #[test]
    fn test_ollama_ignores_api_key() {
        let client = create_client("Ollama", None, Some("unused")).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None) {
            Err(err) => assert!(err.contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
