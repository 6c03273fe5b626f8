//! AI image description.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use cairn_core::{ContentItem, ImageAnalysis, Result};
use cairn_inference::VisionBackend;

use crate::dispatcher::{Extraction, Extractor};

/// Structured prompt sent to vision backends. Backends that cannot honor
/// it return prose, which is kept as the plain description.
const IMAGE_PROMPT: &str = "Describe this image as JSON with the fields: \
\"description\" (one paragraph), \"objects\" (array of object names), \
\"scene\" (setting, or null), \"colors\" (array of dominant colors), \
\"mood\" (overall mood, or null), \"embedded_text\" (any visible text, or null). \
Respond with only the JSON object.";

/// Extractor for image items.
///
/// Tries the primary vision backend, then the secondary; when both fail
/// the item gets a neutral placeholder analysis. Never errors, so image
/// processing always completes.
pub struct ImageExtractor {
    primary: Arc<dyn VisionBackend>,
    secondary: Option<Arc<dyn VisionBackend>>,
}

impl ImageExtractor {
    pub fn new(primary: Arc<dyn VisionBackend>) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    pub fn with_secondary(mut self, secondary: Arc<dyn VisionBackend>) -> Self {
        self.secondary = Some(secondary);
        self
    }

    async fn describe(&self, item: &ContentItem, data: &[u8]) -> Option<String> {
        match self
            .primary
            .describe_image(data, &item.mime_type, IMAGE_PROMPT)
            .await
        {
            Ok(response) => return Some(response),
            Err(e) => {
                warn!(
                    file_id = %item.id,
                    provider = self.primary.name(),
                    error = %e,
                    "Primary vision backend failed"
                );
            }
        }

        let secondary = self.secondary.as_ref()?;
        match secondary
            .describe_image(data, &item.mime_type, IMAGE_PROMPT)
            .await
        {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(
                    file_id = %item.id,
                    provider = secondary.name(),
                    error = %e,
                    "Secondary vision backend failed"
                );
                None
            }
        }
    }
}

/// Parse a backend response into an [`ImageAnalysis`].
///
/// Accepts the raw JSON object, a JSON object inside a markdown code
/// fence, or free prose (kept as the description).
fn parse_analysis(response: &str) -> ImageAnalysis {
    let trimmed = response.trim();

    let candidate = if let Some(stripped) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    {
        stripped.trim_end_matches("```").trim()
    } else {
        trimmed
    };

    match serde_json::from_str::<ImageAnalysis>(candidate) {
        Ok(analysis) if !analysis.description.trim().is_empty() => analysis,
        _ => ImageAnalysis {
            description: trimmed.to_string(),
            ..Default::default()
        },
    }
}

#[async_trait]
impl Extractor for ImageExtractor {
    async fn extract(&self, item: &ContentItem, data: &[u8]) -> Result<Extraction> {
        let analysis = match self.describe(item, data).await {
            Some(response) if !response.trim().is_empty() => parse_analysis(&response),
            _ => ImageAnalysis::placeholder(),
        };

        Ok(Extraction {
            image: Some(analysis),
            ..Default::default()
        })
    }

    fn name(&self) -> &str {
        "image"
    }
}
