//! Embedding providers.
//!
//! Provider-agnostic embedding generation, selected by configuration.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
