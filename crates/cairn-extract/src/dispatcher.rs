//! Extractor trait and category dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use cairn_core::{
    clean_extracted_text, ContentItem, Error, FileCategory, ImageAnalysis, Result, VideoAnalysis,
};

/// What one extraction produced. Fields other than the matching
/// category's stay `None`.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Extracted (not yet cleaned) text.
    pub text: Option<String>,
    /// Structured image description.
    pub image: Option<ImageAnalysis>,
    /// Audio transcript.
    pub audio_transcript: Option<String>,
    /// Video analysis.
    pub video: Option<VideoAnalysis>,
}

/// One category's extraction strategy.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract content from raw file bytes.
    async fn extract(&self, item: &ContentItem, data: &[u8]) -> Result<Extraction>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Routes items to the extractor registered for their category.
pub struct ExtractionDispatcher {
    extractors: HashMap<FileCategory, Arc<dyn Extractor>>,
}

impl ExtractionDispatcher {
    /// An empty dispatcher. Items in unregistered categories extract to
    /// nothing rather than failing.
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Register an extractor for a category, replacing any existing one.
    pub fn register(mut self, category: FileCategory, extractor: Arc<dyn Extractor>) -> Self {
        self.extractors.insert(category, extractor);
        self
    }

    /// Categories with a registered extractor.
    pub fn categories(&self) -> Vec<FileCategory> {
        self.extractors.keys().copied().collect()
    }

    /// Read the item's bytes and run the matching extractor.
    ///
    /// Extracted text and transcripts are cleaned (whitespace collapse,
    /// character filtering, length cap) before being returned.
    pub async fn extract(&self, item: &ContentItem) -> Result<Extraction> {
        let Some(extractor) = self.extractors.get(&item.category) else {
            debug!(
                file_id = %item.id,
                category = %item.category,
                "No extractor registered for category"
            );
            return Ok(Extraction::default());
        };

        let data = tokio::fs::read(&item.storage_path).await.map_err(|e| {
            Error::Extraction(format!(
                "Failed to read '{}': {}",
                item.storage_path, e
            ))
        })?;

        debug!(
            file_id = %item.id,
            category = %item.category,
            extractor = extractor.name(),
            bytes = data.len(),
            "Dispatching extraction"
        );

        let mut extraction = extractor.extract(item, &data).await?;
        extraction.text = extraction
            .text
            .as_deref()
            .map(clean_extracted_text)
            .filter(|t| !t.is_empty());
        extraction.audio_transcript = extraction
            .audio_transcript
            .as_deref()
            .map(clean_extracted_text)
            .filter(|t| !t.is_empty());
        if let Some(video) = &mut extraction.video {
            video.transcript = video
                .transcript
                .as_deref()
                .map(clean_extracted_text)
                .filter(|t| !t.is_empty());
        }

        Ok(extraction)
    }
}

impl Default for ExtractionDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use uuid::Uuid;

    struct Upcase;

    #[async_trait]
    impl Extractor for Upcase {
        async fn extract(&self, _item: &ContentItem, data: &[u8]) -> Result<Extraction> {
            Ok(Extraction {
                text: Some(String::from_utf8_lossy(data).to_uppercase()),
                ..Default::default()
            })
        }

        fn name(&self) -> &str {
            "upcase"
        }
    }

    fn item_at(path: &str, category: FileCategory) -> ContentItem {
        ContentItem::new(Uuid::new_v4(), "f.txt", path, "text/plain", category)
    }

    #[tokio::test]
    async fn unregistered_category_extracts_nothing() {
        let dispatcher = ExtractionDispatcher::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();

        let item = item_at(&file.path().to_string_lossy(), FileCategory::Other);
        let extraction = dispatcher.extract(&item).await.unwrap();
        assert!(extraction.text.is_none());
    }

    #[tokio::test]
    async fn missing_file_is_an_extraction_error() {
        let dispatcher =
            ExtractionDispatcher::new().register(FileCategory::Document, Arc::new(Upcase));
        let item = item_at("/nonexistent/path/file.txt", FileCategory::Document);

        let err = dispatcher.extract(&item).await.unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[tokio::test]
    async fn output_text_is_cleaned() {
        let dispatcher =
            ExtractionDispatcher::new().register(FileCategory::Document, Arc::new(Upcase));
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello   \n\n  world").unwrap();

        let item = item_at(&file.path().to_string_lossy(), FileCategory::Document);
        let extraction = dispatcher.extract(&item).await.unwrap();
        assert_eq!(extraction.text.as_deref(), Some("HELLO WORLD"));
    }
}
