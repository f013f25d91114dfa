//! Chat-completion client crate.
//!
//! A provider-agnostic `LlmClient` trait over role-tagged chat messages,
//! with two implementations:
//! - **Hugging Face**: hosted OpenAI-compatible router (default)
//! - **Ollama**: local runtime
//!
//! # Example
//! ```no_run
//! use docchat_llm::{ChatMessage, LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new(vec![ChatMessage::user("Hello, world!")], "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

pub use client::{
    ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage, Role,
};
pub use factory::create_client;
pub use providers::{HuggingFaceClient, OllamaClient};
pub use types::ProviderType;
