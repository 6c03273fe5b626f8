//! Audio transcription.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use cairn_core::{ContentItem, Result};
use cairn_inference::TranscriptionBackend;

use crate::dispatcher::{Extraction, Extractor};

/// Extractor for audio items.
///
/// Transcription is optional: without a configured backend, or when the
/// backend fails, the item simply has no transcript.
pub struct AudioExtractor {
    backend: Option<Arc<dyn TranscriptionBackend>>,
}

impl AudioExtractor {
    pub fn new(backend: Arc<dyn TranscriptionBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// An extractor with no backend. Audio items pass through untranscribed.
    pub fn disabled() -> Self {
        Self { backend: None }
    }
}

#[async_trait]
impl Extractor for AudioExtractor {
    async fn extract(&self, item: &ContentItem, data: &[u8]) -> Result<Extraction> {
        let Some(backend) = &self.backend else {
            return Ok(Extraction::default());
        };

        match backend.transcribe(data, &item.mime_type).await {
            Ok(transcript) if !transcript.trim().is_empty() => Ok(Extraction {
                audio_transcript: Some(transcript),
                ..Default::default()
            }),
            Ok(_) => Ok(Extraction::default()),
            Err(e) => {
                warn!(
                    file_id = %item.id,
                    provider = backend.name(),
                    error = %e,
                    "Transcription failed, item stays untranscribed"
                );
                Ok(Extraction::default())
            }
        }
    }

    fn name(&self) -> &str {
        "audio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::FileCategory;
    use cairn_inference::mock::MockTranscriptionBackend;
    use uuid::Uuid;

    fn audio_item() -> ContentItem {
        ContentItem::new(
            Uuid::new_v4(),
            "talk.mp3",
            "/data/talk.mp3",
            "audio/mpeg",
            FileCategory::Audio,
        )
    }

    #[tokio::test]
    async fn transcript_is_returned() {
        let extractor =
            AudioExtractor::new(Arc::new(MockTranscriptionBackend::returning("hello world")));
        let extraction = extractor.extract(&audio_item(), b"mp3").await.unwrap();
        assert_eq!(extraction.audio_transcript.as_deref(), Some("hello world"));
    }

    #[tokio::test]
    async fn backend_failure_is_not_an_error() {
        let extractor = AudioExtractor::new(Arc::new(MockTranscriptionBackend::failing()));
        let extraction = extractor.extract(&audio_item(), b"mp3").await.unwrap();
        assert!(extraction.audio_transcript.is_none());
    }

    #[tokio::test]
    async fn disabled_extractor_passes_through() {
        let extraction = AudioExtractor::disabled()
            .extract(&audio_item(), b"mp3")
            .await
            .unwrap();
        assert!(extraction.audio_transcript.is_none());
    }
}
