//! docchat core library
//!
//! Foundational pieces shared by every docchat crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging setup
//! - Layered configuration (defaults, `.env`, YAML, environment, flags)

pub mod config;
pub mod error;
pub mod logging;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
