//! Repository trait implemented by the storage layer.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ContentItem, Folder, ProcessingOutcome};
use crate::search::SearchOptions;

/// Read/write access to content items' processing fields and search
/// candidate queries.
///
/// Implementations must make [`try_claim`](Self::try_claim) an atomic
/// compare-and-swap on the processing state; it is the only cross-request
/// synchronization the pipeline relies on.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Fetch an item by id. `Ok(None)` when it does not exist.
    async fn fetch(&self, id: Uuid) -> Result<Option<ContentItem>>;

    /// Atomically transition `Pending → Processing`.
    ///
    /// Returns the claimed item, or `None` when the item was not in
    /// `Pending` state (already claimed, already processed, or missing).
    async fn try_claim(&self, id: Uuid) -> Result<Option<ContentItem>>;

    /// Persist a processing attempt's outcome: every derived field, both
    /// diagnostics, `is_processed = true`, `processed_at = now`, state
    /// `Processed`. Runs for degraded outcomes too.
    async fn complete_processing(
        &self,
        id: Uuid,
        outcome: ProcessingOutcome,
    ) -> Result<ContentItem>;

    /// Clear derived fields and diagnostics, returning the item to
    /// `Pending` so a reprocess attempt can claim it.
    async fn reset_processing(&self, id: Uuid) -> Result<ContentItem>;

    /// Case-insensitive substring candidates over name, description, tags,
    /// extracted text, and media side-fields. Non-deleted, scope/category/
    /// date filtered, at most `fetch_limit` rows.
    async fn lexical_candidates(
        &self,
        owner: Uuid,
        query: &str,
        options: &SearchOptions,
        fetch_limit: usize,
    ) -> Result<Vec<ContentItem>>;

    /// Processed entities with a non-null embedding, same filters as the
    /// lexical path, capped at `cap` rows to bound scan cost.
    async fn semantic_candidates(
        &self,
        owner: Uuid,
        options: &SearchOptions,
        cap: usize,
    ) -> Result<Vec<ContentItem>>;

    /// Files whose extracted text contains `query` (case-insensitive).
    async fn files_matching_content(
        &self,
        owner: Uuid,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>>;

    /// Files whose name contains `query` (case-insensitive).
    async fn files_matching_name(
        &self,
        owner: Uuid,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ContentItem>>;

    /// Files with an exact case-insensitive tag membership match.
    async fn files_with_tag(&self, owner: Uuid, tag: &str) -> Result<Vec<ContentItem>>;

    /// Folders with an exact case-insensitive tag membership match.
    async fn folders_with_tag(&self, owner: Uuid, tag: &str) -> Result<Vec<Folder>>;
}
