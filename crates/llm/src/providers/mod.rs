//! Chat-completion provider implementations.

pub mod huggingface;
pub mod ollama;

pub use huggingface::HuggingFaceClient;
pub use ollama::OllamaClient;

/// Append `bytes` to `buffer` and drain every complete line from it.
///
/// Network chunks split lines and multi-byte characters anywhere, so the
/// partial trailing line stays in `buffer` as raw bytes and is decoded only
/// once its newline arrives.
pub(crate) fn drain_lines(buffer: &mut Vec<u8>, bytes: &[u8]) -> Vec<String> {
    buffer.extend_from_slice(bytes);

    let mut lines = Vec::new();
    while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = buffer.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&raw);
        let line = line.trim_end_matches(['\r', '\n']);
        if !line.trim().is_empty() {
            lines.push(line.to_string());
        }
    }
    lines
}

/// Pull a readable message out of a provider error body.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => match &value["error"] {
            serde_json::Value::String(msg) => msg.clone(),
            serde_json::Value::Object(obj) => obj
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| body.to_string()),
            _ => body.to_string(),
        },
        Err(_) => body.to_string(),
    }
}
