//! Capability traits for external AI providers.
//!
//! Wire formats are provider details; callers program against these traits
//! and the fallback chains that wrap them.

use async_trait::async_trait;
use cairn_core::Result;

/// Backend that converts text into a fixed-dimension embedding vector.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Embed a single text. Implementations apply their own timeout and
    /// retry policy; a returned error means this provider is done trying.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embedding dimension produced by this backend.
    fn dimension(&self) -> usize;

    /// Short provider name for logs and exhaustion diagnostics.
    fn name(&self) -> &str;
}

/// Backend for describing images using vision models.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Describe an image using the given prompt.
    async fn describe_image(&self, image_data: &[u8], mime_type: &str, prompt: &str)
        -> Result<String>;

    /// Short provider name for logs.
    fn name(&self) -> &str;
}

/// Backend for transcribing audio to text.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Transcribe audio data, returning the full text.
    async fn transcribe(&self, audio_data: &[u8], mime_type: &str) -> Result<String>;

    /// Short provider name for logs.
    fn name(&self) -> &str;
}

/// Backend for abstractive summarization.
#[async_trait]
pub trait SummarizationBackend: Send + Sync {
    /// Summarize `text` to roughly `max_len`..`min_len` characters.
    async fn summarize(&self, text: &str, max_len: usize, min_len: usize) -> Result<String>;

    /// Short provider name for logs.
    fn name(&self) -> &str;
}

/// Decode a provider embedding response into a flat numeric vector.
///
/// Accepts the shapes seen across providers: a flat array, a nested
/// single-row array (`[[..]]`), and `{"embedding": [..]}` /
/// `{"embeddings": [[..]]}` wrappers. Returns `None` for anything empty
/// or non-numeric so the caller can move on to the next fallback.
pub fn decode_embedding(value: &serde_json::Value) -> Option<Vec<f32>> {
    match value {
        serde_json::Value::Array(items) if !items.is_empty() => {
            // Nested form: take the first row.
            if items[0].is_array() {
                return decode_embedding(&items[0]);
            }
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(item.as_f64()? as f32);
            }
            Some(out)
        }
        serde_json::Value::Object(map) => {
            if let Some(inner) = map.get("embedding") {
                return decode_embedding(inner);
            }
            if let Some(inner) = map.get("embeddings") {
                return decode_embedding(inner);
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_flat_array() {
        let v = json!([0.1, 0.2, 0.3]);
        assert_eq!(decode_embedding(&v), Some(vec![0.1, 0.2, 0.3]));
    }

    #[test]
    fn decodes_nested_array_first_row() {
        let v = json!([[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(decode_embedding(&v), Some(vec![1.0, 2.0]));
    }

    #[test]
    fn decodes_embedding_object_wrappers() {
        assert_eq!(
            decode_embedding(&json!({"embedding": [0.5, 0.6]})),
            Some(vec![0.5, 0.6])
        );
        assert_eq!(
            decode_embedding(&json!({"embeddings": [[0.7]]})),
            Some(vec![0.7])
        );
    }

    #[test]
    fn rejects_empty_and_non_numeric() {
        assert_eq!(decode_embedding(&json!([])), None);
        assert_eq!(decode_embedding(&json!(["a", "b"])), None);
        assert_eq!(decode_embedding(&json!({"error": "loading"})), None);
        assert_eq!(decode_embedding(&json!("nope")), None);
    }

    #[test]
    fn rejects_mixed_numeric_and_text() {
        assert_eq!(decode_embedding(&json!([0.1, "x", 0.3])), None);
    }
}
