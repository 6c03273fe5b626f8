//! # cairn-extract
//!
//! Per-category content extraction: document/code text, AI image
//! description, audio transcription, and best-effort video analysis,
//! routed by an [`ExtractionDispatcher`] keyed on
//! [`FileCategory`](cairn_core::FileCategory).

use std::sync::Arc;

use cairn_core::FileCategory;
use cairn_inference::{HfVisionBackend, OllamaVisionBackend, WhisperBackend};

pub mod audio;
pub mod dispatcher;
pub mod document;
pub mod image;
pub mod video;

pub use audio::AudioExtractor;
pub use dispatcher::{Extraction, ExtractionDispatcher, Extractor};
pub use document::DocumentExtractor;
pub use image::ImageExtractor;
pub use video::VideoExtractor;

/// Default deployment dispatcher, backends configured from the
/// environment.
///
/// Ollama is the primary vision provider when `OLLAMA_VISION_MODEL` is
/// set, with Hugging Face captioning as secondary; transcription is
/// active only when `WHISPER_BASE_URL` is set.
pub fn dispatcher_from_env() -> ExtractionDispatcher {
    let document = Arc::new(DocumentExtractor);

    let caption = Arc::new(HfVisionBackend::from_env());
    let image = match OllamaVisionBackend::from_env() {
        Some(ollama) => ImageExtractor::new(Arc::new(ollama)).with_secondary(caption),
        None => ImageExtractor::new(caption),
    };

    let transcription = WhisperBackend::from_env().map(Arc::new);
    let audio = match &transcription {
        Some(backend) => AudioExtractor::new(backend.clone()),
        None => AudioExtractor::disabled(),
    };
    let video = match &transcription {
        Some(backend) => VideoExtractor::new(backend.clone()),
        None => VideoExtractor::placeholder_only(),
    };

    ExtractionDispatcher::new()
        .register(FileCategory::Document, document.clone())
        .register(FileCategory::Code, document.clone())
        .register(FileCategory::Other, document)
        .register(FileCategory::Image, Arc::new(image))
        .register(FileCategory::Audio, Arc::new(audio))
        .register(FileCategory::Video, Arc::new(video))
}
