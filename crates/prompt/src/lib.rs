//! Prompt system for document-grounded answers.
//!
//! This crate provides:
//! - Response modes (strict, hybrid)
//! - YAML prompt definitions, built in or overridden per workspace
//! - Handlebars rendering of the user message
//! - Chat history trimming

pub mod builder;
pub mod loader;
pub mod types;

pub use builder::{build_prompt, trim_history};
pub use loader::{builtin_prompt, list_prompts, load_prompt, PromptSet};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, GenerationSettings, HistorySettings, PromptDefinition,
    ResponseMode,
};
