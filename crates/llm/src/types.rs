//! Provider identification.

/// Chat-completion providers known to the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    HuggingFace,
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "huggingface" | "hf" => Some(Self::HuggingFace),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HuggingFace => "huggingface",
            Self::Ollama => "ollama",
        }
    }

    /// Whether the provider is hosted and needs an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::HuggingFace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(ProviderType::parse("huggingface"), Some(ProviderType::HuggingFace));
        assert_eq!(ProviderType::parse("HF"), Some(ProviderType::HuggingFace));
        assert_eq!(ProviderType::parse("ollama"), Some(ProviderType::Ollama));
        assert_eq!(ProviderType::parse("openai"), None);
    }

    #[test]
    fn test_requires_api_key() {
        assert!(ProviderType::HuggingFace.requires_api_key());
        assert!(!ProviderType::Ollama.requires_api_key());
        assert_eq!(ProviderType::HuggingFace.as_str(), "huggingface");
    }
}
