//! Idempotent schema setup for the content tables.
//!
//! Deployments that manage migrations externally can skip this; it exists
//! so a fresh database (and the integration test harness) can be brought
//! up with one call.

use sqlx::PgPool;
use tracing::info;

use cairn_core::{defaults, Error, Result};

/// Create the content tables and supporting indexes if they do not exist.
///
/// Requires the `vector` extension (pgvector) to be installable by the
/// connected role.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
        .execute(pool)
        .await
        .map_err(Error::Database)?;

    let create_items = format!(
        r#"
        CREATE TABLE IF NOT EXISTS content_items (
            id UUID PRIMARY KEY,
            owner_id UUID NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            tags TEXT[] NOT NULL DEFAULT '{{}}',
            storage_path TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT 'other',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            deleted_at TIMESTAMPTZ,
            extracted_text TEXT,
            embedding vector({dim}),
            summary TEXT,
            processing_state TEXT NOT NULL DEFAULT 'pending',
            is_processed BOOLEAN NOT NULL DEFAULT FALSE,
            processed_at TIMESTAMPTZ,
            text_extraction_error TEXT,
            embedding_error TEXT,
            image_analysis JSONB,
            audio_transcript TEXT,
            video_analysis JSONB
        )
        "#,
        dim = defaults::EMBED_DIMENSION
    );
    sqlx::query(&create_items)
        .execute(pool)
        .await
        .map_err(Error::Database)?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS folders (
            id UUID PRIMARY KEY,
            owner_id UUID NOT NULL,
            name TEXT NOT NULL,
            tags TEXT[] NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            deleted_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(Error::Database)?;

    for ddl in [
        "CREATE INDEX IF NOT EXISTS idx_content_items_owner ON content_items (owner_id) WHERE deleted_at IS NULL",
        "CREATE INDEX IF NOT EXISTS idx_content_items_state ON content_items (processing_state) WHERE deleted_at IS NULL",
        "CREATE INDEX IF NOT EXISTS idx_content_items_created ON content_items (created_at)",
        "CREATE INDEX IF NOT EXISTS idx_folders_owner ON folders (owner_id) WHERE deleted_at IS NULL",
    ] {
        sqlx::query(ddl).execute(pool).await.map_err(Error::Database)?;
    }

    info!(
        subsystem = "store",
        component = "schema",
        op = "ensure",
        "Content schema ready"
    );
    Ok(())
}
