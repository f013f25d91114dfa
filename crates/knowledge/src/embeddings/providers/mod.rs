//! Embedding provider implementations.

pub mod huggingface;
pub mod ollama;
pub mod trigram;

pub use huggingface::HuggingFaceProvider;
pub use ollama::OllamaProvider;
pub use trigram::TrigramProvider;

use docchat_core::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;

/// Maximum attempts for a failed embedding request
pub(crate) const MAX_RETRIES: u32 = 3;

/// Initial backoff duration in milliseconds
pub(crate) const INITIAL_BACKOFF_MS: u64 = 100;

/// Request timeout in seconds
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Run `op` up to `retries` times with exponential backoff between attempts.
pub(crate) async fn with_retries<T, F, Fut>(retries: u32, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 0;
    let mut last_error = None;

    while attempt < retries {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempt += 1;

                if attempt < retries {
                    let backoff_ms = INITIAL_BACKOFF_MS * 2_u64.pow(attempt - 1);
                    tracing::warn!(
                        "Embedding failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt,
                        retries,
                        backoff_ms,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| AppError::Knowledge("Unknown embedding error".to_string())))
}

/// Ensure every vector has the configured dimension.
pub(crate) fn check_dimensions(
    provider: &str,
    vectors: &[Vec<f32>],
    expected: usize,
) -> AppResult<()> {
    match vectors.iter().find(|v| v.len() != expected) {
        Some(bad) => Err(AppError::Knowledge(format!(
            "{} returned {} dimensions, expected {}",
            provider,
            bad.len(),
            expected
        ))),
        None => Ok(()),
    }
}
