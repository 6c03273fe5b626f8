//! Search request/result types and vector similarity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;
use crate::models::{ContentItem, FileCategory, Folder};
use crate::temporal::DateRangeFilter;

/// Which signal produced a search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMatchType {
    /// Lexical substring match.
    Text,
    /// Semantic (embedding similarity) match.
    Ai,
    /// Filename-only search.
    Filename,
    /// Tag search.
    Tags,
    /// Extracted-content-only search.
    Content,
}

/// Options for a search query. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum number of results returned after fusion.
    pub limit: usize,
    /// Minimum semantic similarity kept by the semantic path.
    pub min_score: f32,
    /// Optional category filter.
    pub category: Option<FileCategory>,
    /// Optional creation date filter.
    pub date_range: Option<DateRangeFilter>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: defaults::DEFAULT_SEARCH_LIMIT,
            min_score: defaults::DEFAULT_MIN_SCORE,
            category: None,
            date_range: None,
        }
    }
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn with_category(mut self, category: FileCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_date_range(mut self, range: DateRangeFilter) -> Self {
        self.date_range = Some(range);
        self
    }
}

/// The entity behind a search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchEntity {
    File(Box<ContentItem>),
    Folder(Folder),
}

impl SearchEntity {
    pub fn id(&self) -> Uuid {
        match self {
            Self::File(item) => item.id,
            Self::Folder(folder) => folder.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::File(item) => &item.name,
            Self::Folder(folder) => &folder.name,
        }
    }
}

/// One search hit with its fused score in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub entity: SearchEntity,
    pub score: f32,
    pub match_type: SearchMatchType,
}

impl SearchResult {
    pub fn file(item: ContentItem, score: f32, match_type: SearchMatchType) -> Self {
        Self {
            entity: SearchEntity::File(Box::new(item)),
            score,
            match_type,
        }
    }

    pub fn folder(folder: Folder, score: f32, match_type: SearchMatchType) -> Self {
        Self {
            entity: SearchEntity::Folder(folder),
            score,
            match_type,
        }
    }
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when either vector is empty, the lengths differ, or either
/// norm is zero. Never panics, so ranking loops can call it on arbitrary
/// stored embeddings.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors_is_one() {
        let v = vec![0.3, -1.2, 4.5, 0.01];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-5, "got {}", sim);
    }

    #[test]
    fn cosine_orthogonal_vectors_is_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn cosine_opposite_vectors_is_negative_one() {
        let a = vec![1.0, 2.0];
        let b = vec![-1.0, -2.0];
        let sim = cosine_similarity(&a, &b);
        assert!((sim + 1.0).abs() < 1e-5);
    }

    #[test]
    fn cosine_empty_or_mismatched_is_zero() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn cosine_zero_norm_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn default_options_use_documented_defaults() {
        let opts = SearchOptions::default();
        assert_eq!(opts.limit, crate::defaults::DEFAULT_SEARCH_LIMIT);
        assert!((opts.min_score - crate::defaults::DEFAULT_MIN_SCORE).abs() < f32::EPSILON);
        assert!(opts.category.is_none());
        assert!(opts.date_range.is_none());
    }

    #[test]
    fn match_type_serde_is_snake_case() {
        assert_eq!(
            serde_json::to_string(&SearchMatchType::Filename).unwrap(),
            "\"filename\""
        );
        assert_eq!(
            serde_json::to_string(&SearchMatchType::Ai).unwrap(),
            "\"ai\""
        );
    }
}
