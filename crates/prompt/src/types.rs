//! Prompt types.

use docchat_core::AppError;
use docchat_llm::ChatMessage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How far the model may stray from the retrieved documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Answer only from the documents
    #[default]
    Strict,

    /// Documents first, general knowledge as a flagged fallback
    Hybrid,
}

impl ResponseMode {
    pub const ALL: [ResponseMode; 2] = [ResponseMode::Strict, ResponseMode::Hybrid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == name)
            .ok_or_else(|| {
                AppError::Prompt(format!(
                    "Unknown response mode: '{}'. Expected one of: {}",
                    name,
                    Self::ALL.map(|mode| mode.as_str()).join(", ")
                ))
            })
    }
}

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Mode this definition serves
    pub mode: ResponseMode,

    /// System message sent first in every request
    pub system: String,

    /// User message template (variables: `context`, `question`)
    pub template: String,

    /// Sampling parameters
    pub generation: GenerationSettings,

    /// How much prior conversation to replay
    #[serde(default)]
    pub history: HistorySettings,
}

/// Sampling parameters for a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub temperature: f32,

    #[serde(rename = "maxTokens")]
    pub max_tokens: u32,

    #[serde(rename = "topP", default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

/// Chat history replay settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySettings {
    /// Number of user/assistant exchanges replayed to the model
    #[serde(rename = "maxTurns")]
    pub max_turns: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { max_turns: 5 }
    }
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message, trimmed history, then the rendered question
    pub messages: Vec<ChatMessage>,

    pub temperature: f32,

    pub max_tokens: u32,

    pub top_p: Option<f32>,

    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    pub mode: ResponseMode,

    /// History messages that survived trimming
    #[serde(rename = "historyMessages")]
    pub history_messages: usize,
}
