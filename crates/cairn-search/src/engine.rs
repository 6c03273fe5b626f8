//! Hybrid search: lexical substring matching fused with embedding
//! similarity.
//!
//! Scores live in [0, 1] across both signals so fusion can compare them
//! directly. The lexical path always runs; the semantic path degrades to
//! nothing when the query cannot be embedded.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use cairn_core::{
    cosine_similarity, defaults, ContentRepository, Error, Result, SearchMatchType, SearchOptions,
    SearchResult,
};
use cairn_inference::EmbeddingChain;

/// Owner-scoped search over content items and folders.
pub struct SearchEngine {
    store: Arc<dyn ContentRepository>,
    embeddings: EmbeddingChain,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn ContentRepository>, embeddings: EmbeddingChain) -> Self {
        Self { store, embeddings }
    }

    /// Hybrid search combining the lexical and semantic signals.
    pub async fn search(
        &self,
        owner: Uuid,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("Search query cannot be empty".to_string()));
        }

        let start = Instant::now();
        let mut fused: HashMap<Uuid, SearchResult> = HashMap::new();

        // Lexical path seeds the map.
        let needle = query.to_lowercase();
        let candidates = self
            .store
            .lexical_candidates(owner, query, options, options.limit * 2)
            .await?;
        let lexical_count = candidates.len();
        for item in candidates {
            let mut score = defaults::LEXICAL_BASE_SCORE;
            if item.name.to_lowercase().contains(&needle) {
                score += defaults::LEXICAL_NAME_BONUS;
            }
            if item
                .extracted_text
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&needle))
            {
                score += defaults::LEXICAL_CONTENT_BONUS;
            }
            let score = score.min(1.0);
            fused.insert(item.id, SearchResult::file(item, score, SearchMatchType::Text));
        }

        // Semantic path refines it. A failed query embedding downgrades
        // the search to lexical-only rather than failing it.
        match self.embeddings.embed_query(query).await {
            Ok(query_vector) => {
                self.fuse_semantic(owner, &query_vector, options, &mut fused)
                    .await?;
            }
            Err(e) => {
                warn!(
                    subsystem = "search",
                    owner_id = %owner,
                    error = %e,
                    "Query embedding failed, returning lexical results only"
                );
            }
        }

        let mut results: Vec<SearchResult> = fused.into_values().collect();
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(options.limit);

        info!(
            subsystem = "search",
            owner_id = %owner,
            lexical_candidates = lexical_count,
            result_count = results.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Hybrid search complete"
        );
        Ok(results)
    }

    /// Rank semantic candidates and merge them into `fused`. A semantic
    /// hit replaces a lexical one only with a strictly greater score.
    async fn fuse_semantic(
        &self,
        owner: Uuid,
        query_vector: &[f32],
        options: &SearchOptions,
        fused: &mut HashMap<Uuid, SearchResult>,
    ) -> Result<()> {
        let candidates = self
            .store
            .semantic_candidates(owner, options, defaults::SEMANTIC_CANDIDATE_CAP)
            .await?;

        debug!(
            subsystem = "search",
            owner_id = %owner,
            candidate_count = candidates.len(),
            "Ranking semantic candidates"
        );

        for chunk in candidates.chunks(defaults::SEMANTIC_CHUNK_SIZE) {
            for item in chunk {
                let Some(embedding) = &item.embedding else {
                    continue;
                };
                let similarity = cosine_similarity(query_vector, embedding);
                if similarity < options.min_score {
                    continue;
                }

                match fused.get_mut(&item.id) {
                    Some(existing) if similarity > existing.score => {
                        *existing =
                            SearchResult::file(item.clone(), similarity, SearchMatchType::Ai);
                    }
                    Some(_) => {}
                    None => {
                        fused.insert(
                            item.id,
                            SearchResult::file(item.clone(), similarity, SearchMatchType::Ai),
                        );
                    }
                }
            }
            // Keep the scheduler responsive during large scans.
            tokio::task::yield_now().await;
        }

        Ok(())
    }

    /// Search extracted text only. Every hit carries the same fixed score.
    pub async fn search_by_content(
        &self,
        owner: Uuid,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("Search query cannot be empty".to_string()));
        }

        let items = self
            .store
            .files_matching_content(owner, query, limit)
            .await?;
        Ok(items
            .into_iter()
            .map(|item| {
                SearchResult::file(item, defaults::CONTENT_SEARCH_SCORE, SearchMatchType::Content)
            })
            .collect())
    }

    /// Search file names only.
    pub async fn search_by_name(
        &self,
        owner: Uuid,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("Search query cannot be empty".to_string()));
        }

        let items = self.store.files_matching_name(owner, query, limit).await?;
        Ok(items
            .into_iter()
            .map(|item| {
                SearchResult::file(item, defaults::FILENAME_SEARCH_SCORE, SearchMatchType::Filename)
            })
            .collect())
    }

    /// Exact tag membership over files and folders, case-insensitive.
    /// Files come before folders on equal scores.
    pub async fn search_by_tags(&self, owner: Uuid, tag: &str) -> Result<Vec<SearchResult>> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(Error::InvalidInput("Search tag cannot be empty".to_string()));
        }

        let files = self.store.files_with_tag(owner, tag).await?;
        let folders = self.store.folders_with_tag(owner, tag).await?;

        let mut results: Vec<SearchResult> = files
            .into_iter()
            .map(|item| SearchResult::file(item, defaults::TAG_SEARCH_SCORE, SearchMatchType::Tags))
            .collect();
        results.extend(folders.into_iter().map(|folder| {
            SearchResult::folder(folder, defaults::TAG_SEARCH_SCORE, SearchMatchType::Tags)
        }));

        // Stable sort keeps insertion order on the (equal) scores.
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        Ok(results)
    }
}
