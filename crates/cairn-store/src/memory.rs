//! In-memory content repository.
//!
//! Mirrors the PostgreSQL store's semantics closely enough for the
//! pipeline and search engine tests to run hermetically. Always compiled
//! so downstream crates' integration tests can use it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use cairn_core::{
    ContentItem, ContentRepository, Error, Folder, ProcessingOutcome, ProcessingState, Result,
    SearchOptions,
};

/// In-memory implementation of [`ContentRepository`].
#[derive(Clone, Default)]
pub struct MemoryContentStore {
    items: Arc<RwLock<HashMap<Uuid, ContentItem>>>,
    folders: Arc<RwLock<HashMap<Uuid, Folder>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an item.
    pub async fn insert(&self, item: ContentItem) {
        self.items.write().await.insert(item.id, item);
    }

    /// Seed a folder.
    pub async fn insert_folder(&self, folder: Folder) {
        self.folders.write().await.insert(folder.id, folder);
    }

    fn passes_filters(item: &ContentItem, options: &SearchOptions) -> bool {
        if item.deleted_at.is_some() {
            return false;
        }
        if let Some(category) = options.category {
            if item.category != category {
                return false;
            }
        }
        if let Some(range) = &options.date_range {
            if !range.contains(item.created_at) {
                return false;
            }
        }
        true
    }

    fn lexical_haystack(item: &ContentItem) -> String {
        let mut parts = vec![item.name.clone()];
        if let Some(description) = &item.description {
            parts.push(description.clone());
        }
        parts.push(item.tags.join(" "));
        if let Some(text) = &item.extracted_text {
            parts.push(text.clone());
        }
        parts.push(item.media_text());
        parts.join(" ").to_lowercase()
    }

    fn by_created_desc(mut items: Vec<ContentItem>) -> Vec<ContentItem> {
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }
}

#[async_trait]
impl ContentRepository for MemoryContentStore {
    async fn fetch(&self, id: Uuid) -> Result<Option<ContentItem>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn try_claim(&self, id: Uuid) -> Result<Option<ContentItem>> {
        // Single write lock makes the check-and-set atomic.
        let mut items = self.items.write().await;
        match items.get_mut(&id) {
            Some(item)
                if item.processing_state == ProcessingState::Pending
                    && item.deleted_at.is_none() =>
            {
                item.processing_state = ProcessingState::Processing;
                Ok(Some(item.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn complete_processing(
        &self,
        id: Uuid,
        outcome: ProcessingOutcome,
    ) -> Result<ContentItem> {
        let mut items = self.items.write().await;
        let item = items.get_mut(&id).ok_or(Error::FileNotFound(id))?;

        item.extracted_text = outcome.extracted_text;
        item.embedding = outcome.embedding;
        item.summary = outcome.summary;
        item.text_extraction_error = outcome.text_extraction_error;
        item.embedding_error = outcome.embedding_error;
        item.image_analysis = outcome.image_analysis;
        item.audio_transcript = outcome.audio_transcript;
        item.video_analysis = outcome.video_analysis;
        item.processing_state = ProcessingState::Processed;
        item.is_processed = true;
        item.processed_at = Some(Utc::now());

        Ok(item.clone())
    }

    async fn reset_processing(&self, id: Uuid) -> Result<ContentItem> {
        let mut items = self.items.write().await;
        let item = items.get_mut(&id).ok_or(Error::FileNotFound(id))?;

        item.extracted_text = None;
        item.embedding = None;
        item.summary = None;
        item.text_extraction_error = None;
        item.embedding_error = None;
        item.image_analysis = None;
        item.audio_transcript = None;
        item.video_analysis = None;
        item.processing_state = ProcessingState::Pending;
        item.is_processed = false;
        item.processed_at = None;

        Ok(item.clone())
    }

    async fn lexical_candidates(
        &self,
        owner: Uuid,
        query: &str,
        options: &SearchOptions,
        fetch_limit: usize,
    ) -> Result<Vec<ContentItem>> {
        let needle = query.to_lowercase();
        let items = self.items.read().await;

        let matched: Vec<ContentItem> = items
            .values()
            .filter(|item| item.owner_id == owner && Self::passes_filters(item, options))
            .filter(|item| Self::lexical_haystack(item).contains(&needle))
            .cloned()
            .collect();

        let mut matched = Self::by_created_desc(matched);
        matched.truncate(fetch_limit);
        Ok(matched)
    }

    async fn semantic_candidates(
        &self,
        owner: Uuid,
        options: &SearchOptions,
        cap: usize,
    ) -> Result<Vec<ContentItem>> {
        let items = self.items.read().await;

        let matched: Vec<ContentItem> = items
            .values()
            .filter(|item| {
                item.owner_id == owner
                    && item.is_processed
                    && item.embedding.is_some()
                    && Self::passes_filters(item, options)
            })
            .cloned()
            .collect();

        let mut matched = Self::by_created_desc(matched);
        matched.truncate(cap);
        Ok(matched)
    }

    async fn files_matching_content(
        &self,
        owner: Uuid,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        let needle = query.to_lowercase();
        let items = self.items.read().await;

        let matched: Vec<ContentItem> = items
            .values()
            .filter(|item| item.owner_id == owner && item.deleted_at.is_none())
            .filter(|item| {
                item.extracted_text
                    .as_deref()
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();

        let mut matched = Self::by_created_desc(matched);
        matched.truncate(limit);
        Ok(matched)
    }

    async fn files_matching_name(
        &self,
        owner: Uuid,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        let needle = query.to_lowercase();
        let items = self.items.read().await;

        let matched: Vec<ContentItem> = items
            .values()
            .filter(|item| item.owner_id == owner && item.deleted_at.is_none())
            .filter(|item| item.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        let mut matched = Self::by_created_desc(matched);
        matched.truncate(limit);
        Ok(matched)
    }

    async fn files_with_tag(&self, owner: Uuid, tag: &str) -> Result<Vec<ContentItem>> {
        let items = self.items.read().await;

        let matched: Vec<ContentItem> = items
            .values()
            .filter(|item| item.owner_id == owner && item.deleted_at.is_none())
            .filter(|item| item.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
            .cloned()
            .collect();

        Ok(Self::by_created_desc(matched))
    }

    async fn folders_with_tag(&self, owner: Uuid, tag: &str) -> Result<Vec<Folder>> {
        let folders = self.folders.read().await;

        let mut matched: Vec<Folder> = folders
            .values()
            .filter(|folder| folder.owner_id == owner && folder.deleted_at.is_none())
            .filter(|folder| folder.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)))
            .cloned()
            .collect();

        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }
}
