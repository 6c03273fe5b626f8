//! Core data models for cairn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content category declared at upload time, refined by mime/extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Document,
    Image,
    Audio,
    Video,
    Code,
    #[default]
    Other,
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::Image => write!(f, "image"),
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
            Self::Code => write!(f, "code"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for FileCategory {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "document" => Ok(Self::Document),
            "image" => Ok(Self::Image),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            "code" => Ok(Self::Code),
            "other" => Ok(Self::Other),
            _ => Err(format!("Invalid file category: {}", s)),
        }
    }
}

/// Source/code extensions read verbatim as UTF-8 text.
pub const CODE_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "ts", "jsx", "tsx", "go", "java", "c", "h", "cpp", "hpp", "cs", "rb", "php",
    "swift", "kt", "scala", "sh", "bash", "sql", "html", "css", "scss", "json", "yaml", "yml",
    "toml", "xml", "md",
];

impl FileCategory {
    /// Infer a category from a mime type and original file name.
    ///
    /// The mime prefix wins for media; code is detected by extension since
    /// most source files arrive as `text/plain` or `application/octet-stream`.
    pub fn detect(mime_type: &str, name: &str) -> Self {
        let mime = mime_type.to_lowercase();
        if mime.starts_with("image/") {
            return Self::Image;
        }
        if mime.starts_with("audio/") {
            return Self::Audio;
        }
        if mime.starts_with("video/") {
            return Self::Video;
        }

        if let Some(ext) = extension(name) {
            if CODE_EXTENSIONS.contains(&ext.as_str()) {
                return Self::Code;
            }
        }

        if mime.starts_with("text/")
            || mime == "application/pdf"
            || mime.contains("document")
            || mime.contains("spreadsheet")
            || mime.contains("presentation")
            || mime.contains("msword")
        {
            return Self::Document;
        }

        Self::Other
    }
}

/// Lowercased extension of a file name, if any.
pub fn extension(name: &str) -> Option<String> {
    let ext = name.rsplit_once('.')?.1;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// Processing lifecycle state. The claim step is an atomic
/// `Pending → Processing` transition; `Processed` is terminal until an
/// explicit reprocess resets the entity to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingState {
    #[default]
    Pending,
    Processing,
    Processed,
}

impl std::fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Processed => write!(f, "processed"),
        }
    }
}

impl std::str::FromStr for ProcessingState {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "processed" => Ok(Self::Processed),
            _ => Err(format!("Invalid processing state: {}", s)),
        }
    }
}

/// Structured result of AI image description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    /// Free-text description of the image.
    pub description: String,
    /// Objects detected in the image.
    #[serde(default)]
    pub objects: Vec<String>,
    /// Scene/setting classification.
    #[serde(default)]
    pub scene: Option<String>,
    /// Dominant colors.
    #[serde(default)]
    pub colors: Vec<String>,
    /// Overall mood.
    #[serde(default)]
    pub mood: Option<String>,
    /// Text embedded in the image (signs, labels, captions).
    #[serde(default)]
    pub embedded_text: Option<String>,
}

impl ImageAnalysis {
    /// Neutral placeholder used when every vision provider fails.
    pub fn placeholder() -> Self {
        Self {
            description: "Image content could not be analyzed".to_string(),
            ..Default::default()
        }
    }

    /// Concatenate every textual signal for search indexing.
    pub fn search_text(&self) -> String {
        let mut parts = vec![self.description.clone()];
        parts.extend(self.objects.iter().cloned());
        if let Some(scene) = &self.scene {
            parts.push(scene.clone());
        }
        parts.extend(self.colors.iter().cloned());
        if let Some(mood) = &self.mood {
            parts.push(mood.clone());
        }
        if let Some(text) = &self.embedded_text {
            parts.push(text.clone());
        }
        parts.retain(|p| !p.trim().is_empty());
        parts.join(" ")
    }
}

/// Best-effort video analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysis {
    /// Transcript of the audio track, if one was produced.
    #[serde(default)]
    pub transcript: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Scene labels.
    #[serde(default)]
    pub scenes: Vec<String>,
}

impl VideoAnalysis {
    /// Neutral placeholder when no deeper video analysis is available.
    pub fn placeholder() -> Self {
        Self {
            description: Some("Video content pending deeper analysis".to_string()),
            ..Default::default()
        }
    }
}

/// A content item owned by the storage collaborator. Cairn reads the
/// identity/location fields and mutates only the processing fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub storage_path: String,
    pub mime_type: String,
    pub category: FileCategory,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,

    // Processing fields (owned by cairn)
    pub extracted_text: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub summary: Option<String>,
    pub processing_state: ProcessingState,
    pub is_processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
    pub text_extraction_error: Option<String>,
    pub embedding_error: Option<String>,

    // Media side-fields (present only for the matching category)
    pub image_analysis: Option<ImageAnalysis>,
    pub audio_transcript: Option<String>,
    pub video_analysis: Option<VideoAnalysis>,
}

impl ContentItem {
    /// Create an unprocessed item, the shape the storage collaborator
    /// hands over at upload time.
    pub fn new(
        owner_id: Uuid,
        name: impl Into<String>,
        storage_path: impl Into<String>,
        mime_type: impl Into<String>,
        category: FileCategory,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            description: None,
            tags: Vec::new(),
            storage_path: storage_path.into(),
            mime_type: mime_type.into(),
            category,
            created_at: Utc::now(),
            deleted_at: None,
            extracted_text: None,
            embedding: None,
            summary: None,
            processing_state: ProcessingState::Pending,
            is_processed: false,
            processed_at: None,
            text_extraction_error: None,
            embedding_error: None,
            image_analysis: None,
            audio_transcript: None,
            video_analysis: None,
        }
    }

    /// All media side-field text, for lexical matching and search text.
    pub fn media_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(analysis) = &self.image_analysis {
            parts.push(analysis.search_text());
        }
        if let Some(transcript) = &self.audio_transcript {
            parts.push(transcript.clone());
        }
        if let Some(video) = &self.video_analysis {
            if let Some(t) = &video.transcript {
                parts.push(t.clone());
            }
            if let Some(d) = &video.description {
                parts.push(d.clone());
            }
            parts.extend(video.scenes.iter().cloned());
        }
        parts.retain(|p| !p.trim().is_empty());
        parts.join(" ")
    }
}

/// A folder-like entity. Only tag search touches folders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Folder {
    pub fn new(owner_id: Uuid, name: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.into(),
            tags,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }
}

/// Everything the Complete step writes back in one conditional update.
///
/// The write happens even when individual stages failed; the diagnostics
/// record which ones did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingOutcome {
    pub extracted_text: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub summary: Option<String>,
    pub text_extraction_error: Option<String>,
    pub embedding_error: Option<String>,
    pub image_analysis: Option<ImageAnalysis>,
    pub audio_transcript: Option<String>,
    pub video_analysis: Option<VideoAnalysis>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_image_by_mime() {
        assert_eq!(
            FileCategory::detect("image/png", "photo.png"),
            FileCategory::Image
        );
        assert_eq!(
            FileCategory::detect("image/jpeg", "noext"),
            FileCategory::Image
        );
    }

    #[test]
    fn detect_audio_and_video_by_mime() {
        assert_eq!(
            FileCategory::detect("audio/mpeg", "song.mp3"),
            FileCategory::Audio
        );
        assert_eq!(
            FileCategory::detect("video/mp4", "clip.mp4"),
            FileCategory::Video
        );
    }

    #[test]
    fn detect_code_by_extension() {
        assert_eq!(
            FileCategory::detect("text/plain", "main.rs"),
            FileCategory::Code
        );
        assert_eq!(
            FileCategory::detect("application/octet-stream", "app.py"),
            FileCategory::Code
        );
    }

    #[test]
    fn detect_document_by_mime() {
        assert_eq!(
            FileCategory::detect("application/pdf", "report.pdf"),
            FileCategory::Document
        );
        assert_eq!(
            FileCategory::detect(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                "letter.docx"
            ),
            FileCategory::Document
        );
        assert_eq!(
            FileCategory::detect("text/plain", "notes.unknownext"),
            FileCategory::Document
        );
    }

    #[test]
    fn detect_other_for_unknown_binary() {
        assert_eq!(
            FileCategory::detect("application/octet-stream", "blob.bin"),
            FileCategory::Other
        );
    }

    #[test]
    fn category_round_trips_through_str() {
        for cat in [
            FileCategory::Document,
            FileCategory::Image,
            FileCategory::Audio,
            FileCategory::Video,
            FileCategory::Code,
            FileCategory::Other,
        ] {
            assert_eq!(cat.to_string().parse::<FileCategory>().unwrap(), cat);
        }
    }

    #[test]
    fn processing_state_round_trips_through_str() {
        for state in [
            ProcessingState::Pending,
            ProcessingState::Processing,
            ProcessingState::Processed,
        ] {
            assert_eq!(
                state.to_string().parse::<ProcessingState>().unwrap(),
                state
            );
        }
    }

    #[test]
    fn extension_lowercases_and_handles_missing() {
        assert_eq!(extension("Report.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension("noext"), None);
        assert_eq!(extension("trailing."), None);
    }

    #[test]
    fn image_analysis_search_text_joins_all_signals() {
        let analysis = ImageAnalysis {
            description: "A beach at sunset".to_string(),
            objects: vec!["umbrella".to_string(), "towel".to_string()],
            scene: Some("beach".to_string()),
            colors: vec!["orange".to_string()],
            mood: Some("calm".to_string()),
            embedded_text: Some("Welcome to Goa".to_string()),
        };
        let text = analysis.search_text();
        assert!(text.contains("beach at sunset"));
        assert!(text.contains("umbrella"));
        assert!(text.contains("calm"));
        assert!(text.contains("Welcome to Goa"));
    }

    #[test]
    fn placeholder_analysis_has_empty_structured_fields() {
        let placeholder = ImageAnalysis::placeholder();
        assert!(!placeholder.description.is_empty());
        assert!(placeholder.objects.is_empty());
        assert!(placeholder.scene.is_none());
        assert!(placeholder.embedded_text.is_none());
    }

    #[test]
    fn new_item_starts_unprocessed() {
        let item = ContentItem::new(
            Uuid::new_v4(),
            "a.txt",
            "/data/a.txt",
            "text/plain",
            FileCategory::Document,
        );
        assert_eq!(item.processing_state, ProcessingState::Pending);
        assert!(!item.is_processed);
        assert!(item.processed_at.is_none());
        assert!(item.embedding.is_none());
    }

    #[test]
    fn media_text_includes_transcripts() {
        let mut item = ContentItem::new(
            Uuid::new_v4(),
            "talk.mp3",
            "/data/talk.mp3",
            "audio/mpeg",
            FileCategory::Audio,
        );
        item.audio_transcript = Some("quarterly planning meeting".to_string());
        assert!(item.media_text().contains("quarterly planning"));
    }

    #[test]
    fn category_serde_is_snake_case() {
        let json = serde_json::to_string(&FileCategory::Document).unwrap();
        assert_eq!(json, "\"document\"");
    }
}
