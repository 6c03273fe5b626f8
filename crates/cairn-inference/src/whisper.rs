//! OpenAI-compatible Whisper transcription backend (works with
//! Speaches/faster-whisper-server and the OpenAI audio API).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use cairn_core::{defaults, Error, Result};

use crate::backend::TranscriptionBackend;

/// Transcription backend speaking the `/v1/audio/transcriptions` protocol.
pub struct WhisperBackend {
    client: Client,
    base_url: String,
    model: String,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
}

impl WhisperBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            timeout_secs: defaults::TRANSCRIBE_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables.
    /// Returns `None` if `WHISPER_BASE_URL` is not set.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var(defaults::ENV_WHISPER_BASE_URL).ok()?;
        if base_url.is_empty() {
            return None;
        }
        let model = std::env::var(defaults::ENV_WHISPER_MODEL)
            .unwrap_or_else(|_| defaults::DEFAULT_WHISPER_MODEL.to_string());
        Some(Self::new(base_url, model))
    }

    /// File extension the server expects for the multipart part name.
    fn extension_for(mime_type: &str) -> &'static str {
        match mime_type {
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/wav" | "audio/x-wav" => "wav",
            "audio/ogg" => "ogg",
            "audio/flac" => "flac",
            "audio/aac" => "aac",
            "audio/webm" | "video/webm" => "webm",
            "video/mp4" => "mp4",
            _ => "wav",
        }
    }
}

#[async_trait]
impl TranscriptionBackend for WhisperBackend {
    async fn transcribe(&self, audio_data: &[u8], mime_type: &str) -> Result<String> {
        let url = format!("{}/v1/audio/transcriptions", self.base_url);
        let ext = Self::extension_for(mime_type);

        let file_part = reqwest::multipart::Part::bytes(audio_data.to_vec())
            .file_name(format!("audio.{}", ext))
            .mime_str(mime_type)
            .map_err(|e| Error::Internal(format!("Failed to create multipart: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Request(format!("Transcription request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Request(format!(
                "Transcription API returned {}: {}",
                status, body
            )));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            Error::Serialization(format!("Failed to parse transcription response: {}", e))
        })?;

        Ok(result.text)
    }

    fn name(&self) -> &str {
        "whisper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_mapping_covers_common_types() {
        assert_eq!(WhisperBackend::extension_for("audio/mpeg"), "mp3");
        assert_eq!(WhisperBackend::extension_for("audio/flac"), "flac");
        assert_eq!(WhisperBackend::extension_for("video/mp4"), "mp4");
        assert_eq!(WhisperBackend::extension_for("application/unknown"), "wav");
    }
}
