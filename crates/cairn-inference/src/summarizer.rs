//! Never-throwing summarization wrapper.
//!
//! Short text is its own summary; anything longer goes to the configured
//! summarization backend, and any backend failure degrades to a naive
//! word-truncation so the pipeline always gets a summary string back.

use std::sync::Arc;

use tracing::warn;

use cairn_core::defaults;

use crate::backend::SummarizationBackend;
use crate::huggingface::HfSummarizationBackend;

/// Summarizer with a guaranteed-non-throwing fallback.
pub struct Summarizer {
    backend: Option<Arc<dyn SummarizationBackend>>,
    max_len: usize,
    min_len: usize,
}

impl Summarizer {
    /// Wrap a summarization backend with the default length policy.
    pub fn new(backend: Arc<dyn SummarizationBackend>) -> Self {
        Self {
            backend: Some(backend),
            max_len: defaults::SUMMARY_MAX_LEN,
            min_len: defaults::SUMMARY_MIN_LEN,
        }
    }

    /// A summarizer with no backend: always uses the truncation fallback.
    pub fn fallback_only() -> Self {
        Self {
            backend: None,
            max_len: defaults::SUMMARY_MAX_LEN,
            min_len: defaults::SUMMARY_MIN_LEN,
        }
    }

    /// Default deployment summarizer, configured from the environment.
    pub fn from_env() -> Self {
        Self::new(Arc::new(HfSummarizationBackend::from_env()))
    }

    pub fn with_lengths(mut self, max_len: usize, min_len: usize) -> Self {
        self.max_len = max_len;
        self.min_len = min_len;
        self
    }

    /// Target maximum summary length, the short-text threshold.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Produce a summary. Never fails.
    pub async fn summarize(&self, text: &str) -> String {
        let text = text.trim();
        if text.chars().count() <= self.max_len {
            return text.to_string();
        }

        if let Some(backend) = &self.backend {
            match backend.summarize(text, self.max_len, self.min_len).await {
                Ok(summary) if !summary.trim().is_empty() => return summary.trim().to_string(),
                Ok(_) => {
                    warn!(
                        provider = backend.name(),
                        "Summarization returned empty text, using truncation fallback"
                    );
                }
                Err(e) => {
                    warn!(
                        provider = backend.name(),
                        error = %e,
                        "Summarization failed, using truncation fallback"
                    );
                }
            }
        }

        truncate_summary(text, self.max_len)
    }
}

/// Naive fallback: the first `max_len / 5` words joined with spaces, plus
/// an ellipsis when anything was cut.
fn truncate_summary(text: &str, max_len: usize) -> String {
    let word_budget = (max_len / 5).max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= word_budget {
        return words.join(" ");
    }
    let mut out = words[..word_budget].join(" ");
    out.push_str(defaults::TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSummarizationBackend;

    #[tokio::test]
    async fn short_text_is_returned_unchanged() {
        let summarizer = Summarizer::fallback_only();
        assert_eq!(summarizer.summarize("short note").await, "short note");
    }

    #[tokio::test]
    async fn backend_summary_is_used_for_long_text() {
        let backend = Arc::new(MockSummarizationBackend::returning("the gist"));
        let summarizer = Summarizer::new(backend).with_lengths(20, 5);
        let long = "many words ".repeat(20);
        assert_eq!(summarizer.summarize(&long).await, "the gist");
    }

    #[tokio::test]
    async fn backend_failure_falls_back_to_truncation() {
        let backend = Arc::new(MockSummarizationBackend::failing());
        let summarizer = Summarizer::new(backend).with_lengths(50, 5);
        let long = (0..100)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ");

        let summary = summarizer.summarize(&long).await;
        assert!(summary.starts_with("word0"));
        assert!(summary.ends_with(defaults::TRUNCATION_MARKER));
        // 50 / 5 = 10 words survive
        assert!(summary.contains("word9"));
        assert!(!summary.contains("word10 "));
    }

    #[tokio::test]
    async fn empty_backend_summary_falls_back() {
        let backend = Arc::new(MockSummarizationBackend::returning("   "));
        let summarizer = Summarizer::new(backend).with_lengths(20, 5);
        let long = "alpha beta gamma delta epsilon zeta eta theta".repeat(5);
        let summary = summarizer.summarize(&long).await;
        assert!(!summary.trim().is_empty());
    }

    #[test]
    fn truncate_summary_short_input_has_no_marker() {
        assert_eq!(truncate_summary("one two three", 100), "one two three");
    }
}
