//! Best-effort video analysis.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use cairn_core::{ContentItem, Result, VideoAnalysis};
use cairn_inference::TranscriptionBackend;

use crate::dispatcher::{Extraction, Extractor};

/// Extractor for video items.
///
/// Attempts an audio-track transcript through the transcription backend
/// (speech-to-text services accept common video containers); when that is
/// unavailable the item gets a neutral placeholder analysis. Never errors.
pub struct VideoExtractor {
    transcription: Option<Arc<dyn TranscriptionBackend>>,
}

impl VideoExtractor {
    pub fn new(transcription: Arc<dyn TranscriptionBackend>) -> Self {
        Self {
            transcription: Some(transcription),
        }
    }

    /// An extractor with no transcription backend. Video items get the
    /// placeholder analysis only.
    pub fn placeholder_only() -> Self {
        Self {
            transcription: None,
        }
    }
}

#[async_trait]
impl Extractor for VideoExtractor {
    async fn extract(&self, item: &ContentItem, data: &[u8]) -> Result<Extraction> {
        if let Some(backend) = &self.transcription {
            match backend.transcribe(data, &item.mime_type).await {
                Ok(transcript) if !transcript.trim().is_empty() => {
                    return Ok(Extraction {
                        video: Some(VideoAnalysis {
                            transcript: Some(transcript),
                            ..Default::default()
                        }),
                        ..Default::default()
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        file_id = %item.id,
                        provider = backend.name(),
                        error = %e,
                        "Video transcription failed, using placeholder"
                    );
                }
            }
        }

        Ok(Extraction {
            video: Some(VideoAnalysis::placeholder()),
            ..Default::default()
        })
    }

    fn name(&self) -> &str {
        "video"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::FileCategory;
    use cairn_inference::mock::MockTranscriptionBackend;
    use uuid::Uuid;

    fn video_item() -> ContentItem {
        ContentItem::new(
            Uuid::new_v4(),
            "clip.mp4",
            "/data/clip.mp4",
            "video/mp4",
            FileCategory::Video,
        )
    }

    #[tokio::test]
    async fn transcript_is_attached_to_analysis() {
        let extractor =
            VideoExtractor::new(Arc::new(MockTranscriptionBackend::returning("welcome all")));
        let extraction = extractor.extract(&video_item(), b"mp4").await.unwrap();
        let video = extraction.video.unwrap();
        assert_eq!(video.transcript.as_deref(), Some("welcome all"));
    }

    #[tokio::test]
    async fn failure_yields_placeholder() {
        let extractor = VideoExtractor::new(Arc::new(MockTranscriptionBackend::failing()));
        let extraction = extractor.extract(&video_item(), b"mp4").await.unwrap();
        assert_eq!(extraction.video.unwrap(), VideoAnalysis::placeholder());
    }

    #[tokio::test]
    async fn no_backend_yields_placeholder() {
        let extraction = VideoExtractor::placeholder_only()
            .extract(&video_item(), b"mp4")
            .await
            .unwrap();
        assert_eq!(extraction.video.unwrap(), VideoAnalysis::placeholder());
    }
}
