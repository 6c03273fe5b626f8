//! PostgreSQL content repository.
//!
//! Owns the processing fields of `content_items` and serves the candidate
//! queries for search. The claim transition is a single conditional UPDATE
//! so concurrent processors cannot both win.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use cairn_core::{
    ContentItem, ContentRepository, Error, Folder, ImageAnalysis, ProcessingOutcome, Result,
    SearchOptions, VideoAnalysis,
};

use crate::escape_like;

/// PostgreSQL implementation of [`ContentRepository`].
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

const ITEM_COLUMNS: &str = "id, owner_id, name, description, tags, storage_path, mime_type, \
     category, created_at, deleted_at, extracted_text, embedding, summary, processing_state, \
     is_processed, processed_at, text_extraction_error, embedding_error, image_analysis, \
     audio_transcript, video_analysis";

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_item_row(row: sqlx::postgres::PgRow) -> ContentItem {
        let category: String = row.get("category");
        let state: String = row.get("processing_state");
        let embedding: Option<Vector> = row.try_get("embedding").ok().flatten();
        let image_analysis: Option<serde_json::Value> = row.get("image_analysis");
        let video_analysis: Option<serde_json::Value> = row.get("video_analysis");

        ContentItem {
            id: row.get("id"),
            owner_id: row.get("owner_id"),
            name: row.get("name"),
            description: row.get("description"),
            tags: row.get("tags"),
            storage_path: row.get("storage_path"),
            mime_type: row.get("mime_type"),
            category: category.parse().unwrap_or_default(),
            created_at: row.get("created_at"),
            deleted_at: row.get("deleted_at"),
            extracted_text: row.get("extracted_text"),
            embedding: embedding.map(|v| v.to_vec()),
            summary: row.get("summary"),
            processing_state: state.parse().unwrap_or_default(),
            is_processed: row.get("is_processed"),
            processed_at: row.get("processed_at"),
            text_extraction_error: row.get("text_extraction_error"),
            embedding_error: row.get("embedding_error"),
            image_analysis: image_analysis
                .and_then(|v| serde_json::from_value::<ImageAnalysis>(v).ok()),
            audio_transcript: row.get("audio_transcript"),
            video_analysis: video_analysis
                .and_then(|v| serde_json::from_value::<VideoAnalysis>(v).ok()),
        }
    }

    fn parse_folder_row(row: sqlx::postgres::PgRow) -> Folder {
        Folder {
            id: row.get("id"),
            owner_id: row.get("owner_id"),
            name: row.get("name"),
            tags: row.get("tags"),
            created_at: row.get("created_at"),
            deleted_at: row.get("deleted_at"),
        }
    }

    fn filter_params(
        options: &SearchOptions,
    ) -> (Option<String>, Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let category = options.category.map(|c| c.to_string());
        let (start, end) = match &options.date_range {
            Some(range) => {
                let (s, e) = range.to_boundaries();
                (Some(s), Some(e))
            }
            None => (None, None),
        };
        (category, start, end)
    }

    /// Insert a new item. Upload-side collaborators own this normally; it
    /// is exposed for deployments and the integration test harness.
    pub async fn insert(&self, item: &ContentItem) -> Result<()> {
        let image_analysis = item
            .image_analysis
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let video_analysis = item
            .video_analysis
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO content_items (
                id, owner_id, name, description, tags, storage_path, mime_type, category,
                created_at, deleted_at, extracted_text, embedding, summary, processing_state,
                is_processed, processed_at, text_extraction_error, embedding_error,
                image_analysis, audio_transcript, video_analysis
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8,
                $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21
            )
            "#,
        )
        .bind(item.id)
        .bind(item.owner_id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.tags)
        .bind(&item.storage_path)
        .bind(&item.mime_type)
        .bind(item.category.to_string())
        .bind(item.created_at)
        .bind(item.deleted_at)
        .bind(&item.extracted_text)
        .bind(item.embedding.clone().map(Vector::from))
        .bind(&item.summary)
        .bind(item.processing_state.to_string())
        .bind(item.is_processed)
        .bind(item.processed_at)
        .bind(&item.text_extraction_error)
        .bind(&item.embedding_error)
        .bind(image_analysis)
        .bind(&item.audio_transcript)
        .bind(video_analysis)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    /// Insert a folder.
    pub async fn insert_folder(&self, folder: &Folder) -> Result<()> {
        sqlx::query(
            "INSERT INTO folders (id, owner_id, name, tags, created_at, deleted_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(folder.id)
        .bind(folder.owner_id)
        .bind(&folder.name)
        .bind(&folder.tags)
        .bind(folder.created_at)
        .bind(folder.deleted_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}

#[async_trait]
impl ContentRepository for PgContentStore {
    async fn fetch(&self, id: Uuid) -> Result<Option<ContentItem>> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM content_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_item_row))
    }

    async fn try_claim(&self, id: Uuid) -> Result<Option<ContentItem>> {
        let row = sqlx::query(&format!(
            "UPDATE content_items
             SET processing_state = 'processing'
             WHERE id = $1 AND processing_state = 'pending' AND deleted_at IS NULL
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_item_row))
    }

    async fn complete_processing(
        &self,
        id: Uuid,
        outcome: ProcessingOutcome,
    ) -> Result<ContentItem> {
        let image_analysis = outcome
            .image_analysis
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let video_analysis = outcome
            .video_analysis
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        let row = sqlx::query(&format!(
            "UPDATE content_items SET
                extracted_text = $2,
                embedding = $3,
                summary = $4,
                text_extraction_error = $5,
                embedding_error = $6,
                image_analysis = $7,
                audio_transcript = $8,
                video_analysis = $9,
                processing_state = 'processed',
                is_processed = TRUE,
                processed_at = NOW()
             WHERE id = $1
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(id)
        .bind(&outcome.extracted_text)
        .bind(outcome.embedding.clone().map(Vector::from))
        .bind(&outcome.summary)
        .bind(&outcome.text_extraction_error)
        .bind(&outcome.embedding_error)
        .bind(image_analysis)
        .bind(&outcome.audio_transcript)
        .bind(video_analysis)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_item_row)
            .ok_or(Error::FileNotFound(id))
    }

    async fn reset_processing(&self, id: Uuid) -> Result<ContentItem> {
        let row = sqlx::query(&format!(
            "UPDATE content_items SET
                extracted_text = NULL,
                embedding = NULL,
                summary = NULL,
                text_extraction_error = NULL,
                embedding_error = NULL,
                image_analysis = NULL,
                audio_transcript = NULL,
                video_analysis = NULL,
                processing_state = 'pending',
                is_processed = FALSE,
                processed_at = NULL
             WHERE id = $1
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_item_row)
            .ok_or(Error::FileNotFound(id))
    }

    async fn lexical_candidates(
        &self,
        owner: Uuid,
        query: &str,
        options: &SearchOptions,
        fetch_limit: usize,
    ) -> Result<Vec<ContentItem>> {
        let pattern = format!("%{}%", escape_like(query));
        let (category, start, end) = Self::filter_params(options);

        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM content_items
             WHERE owner_id = $1 AND deleted_at IS NULL
               AND ($2::text IS NULL OR category = $2)
               AND ($3::timestamptz IS NULL OR created_at >= $3)
               AND ($4::timestamptz IS NULL OR created_at <= $4)
               AND (
                    name ILIKE $5
                    OR description ILIKE $5
                    OR array_to_string(tags, ' ') ILIKE $5
                    OR extracted_text ILIKE $5
                    OR audio_transcript ILIKE $5
                    OR image_analysis->>'description' ILIKE $5
                    OR image_analysis->>'scene' ILIKE $5
                    OR image_analysis->>'mood' ILIKE $5
                    OR image_analysis->>'embedded_text' ILIKE $5
                    OR image_analysis->>'objects' ILIKE $5
                    OR image_analysis->>'colors' ILIKE $5
                    OR video_analysis->>'transcript' ILIKE $5
                    OR video_analysis->>'description' ILIKE $5
                    OR video_analysis->>'scenes' ILIKE $5
               )
             ORDER BY created_at DESC
             LIMIT $6"
        ))
        .bind(owner)
        .bind(category)
        .bind(start)
        .bind(end)
        .bind(pattern)
        .bind(fetch_limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_item_row).collect())
    }

    async fn semantic_candidates(
        &self,
        owner: Uuid,
        options: &SearchOptions,
        cap: usize,
    ) -> Result<Vec<ContentItem>> {
        let (category, start, end) = Self::filter_params(options);

        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM content_items
             WHERE owner_id = $1 AND deleted_at IS NULL
               AND is_processed AND embedding IS NOT NULL
               AND ($2::text IS NULL OR category = $2)
               AND ($3::timestamptz IS NULL OR created_at >= $3)
               AND ($4::timestamptz IS NULL OR created_at <= $4)
             ORDER BY created_at DESC
             LIMIT $5"
        ))
        .bind(owner)
        .bind(category)
        .bind(start)
        .bind(end)
        .bind(cap as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_item_row).collect())
    }

    async fn files_matching_content(
        &self,
        owner: Uuid,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        let pattern = format!("%{}%", escape_like(query));

        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM content_items
             WHERE owner_id = $1 AND deleted_at IS NULL
               AND extracted_text ILIKE $2
             ORDER BY created_at DESC
             LIMIT $3"
        ))
        .bind(owner)
        .bind(pattern)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_item_row).collect())
    }

    async fn files_matching_name(
        &self,
        owner: Uuid,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>> {
        let pattern = format!("%{}%", escape_like(query));

        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM content_items
             WHERE owner_id = $1 AND deleted_at IS NULL
               AND name ILIKE $2
             ORDER BY created_at DESC
             LIMIT $3"
        ))
        .bind(owner)
        .bind(pattern)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_item_row).collect())
    }

    async fn files_with_tag(&self, owner: Uuid, tag: &str) -> Result<Vec<ContentItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM content_items
             WHERE owner_id = $1 AND deleted_at IS NULL
               AND EXISTS (
                    SELECT 1 FROM unnest(tags) AS t WHERE lower(t) = lower($2)
               )
             ORDER BY created_at DESC"
        ))
        .bind(owner)
        .bind(tag)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_item_row).collect())
    }

    async fn folders_with_tag(&self, owner: Uuid, tag: &str) -> Result<Vec<Folder>> {
        let rows = sqlx::query(
            "SELECT id, owner_id, name, tags, created_at, deleted_at FROM folders
             WHERE owner_id = $1 AND deleted_at IS NULL
               AND EXISTS (
                    SELECT 1 FROM unnest(tags) AS t WHERE lower(t) = lower($2)
               )
             ORDER BY created_at DESC",
        )
        .bind(owner)
        .bind(tag)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_folder_row).collect())
    }
}
