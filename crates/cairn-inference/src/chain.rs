//! Ordered embedding fallback chain.
//!
//! Providers are tried in registration order; each carries its own
//! timeout/retry policy internally. The chain fails only when every
//! provider fails, and that failure is a distinct error variant so the
//! orchestrator can record it as a diagnostic instead of aborting.

use std::sync::Arc;

use tracing::{debug, warn};

use cairn_core::{defaults, truncate_chars, Error, Result};

use crate::backend::EmbeddingBackend;
use crate::huggingface::HfEmbeddingBackend;
use crate::ollama::OllamaEmbeddingBackend;

/// An ordered list of interchangeable embedding providers.
pub struct EmbeddingChain {
    providers: Vec<Arc<dyn EmbeddingBackend>>,
    char_budget: usize,
}

impl EmbeddingChain {
    /// Build a chain from explicit providers, first is primary.
    pub fn new(providers: Vec<Arc<dyn EmbeddingBackend>>) -> Self {
        Self {
            providers,
            char_budget: defaults::EMBED_CHAR_BUDGET,
        }
    }

    /// Default deployment chain: Hugging Face primary, Ollama secondary,
    /// both configured from the environment.
    pub fn from_env() -> Self {
        Self::new(vec![
            Arc::new(HfEmbeddingBackend::from_env()),
            Arc::new(OllamaEmbeddingBackend::from_env()),
        ])
    }

    /// Override the provider input character budget.
    pub fn with_char_budget(mut self, budget: usize) -> Self {
        self.char_budget = budget;
        self
    }

    /// Provider names in order, for logs and diagnostics.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Embedding dimension of the primary provider.
    pub fn dimension(&self) -> usize {
        self.providers.first().map(|p| p.dimension()).unwrap_or(0)
    }

    /// Embed `text`, walking the fallback chain.
    ///
    /// Returns [`Error::ProvidersExhausted`] only if every provider fails;
    /// [`Error::InvalidInput`] for empty input (callers skip embedding for
    /// empty search text before reaching here).
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput(
                "Cannot embed empty text".to_string(),
            ));
        }
        if self.providers.is_empty() {
            return Err(Error::Config("Embedding chain has no providers".to_string()));
        }

        let input = truncate_chars(trimmed, self.char_budget);

        let mut failures = Vec::new();
        for provider in &self.providers {
            match provider.embed(input).await {
                Ok(vector) => {
                    debug!(
                        provider = provider.name(),
                        dimension = vector.len(),
                        "Embedding generated"
                    );
                    return Ok(vector);
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        error = %e,
                        "Embedding provider failed, falling back"
                    );
                    failures.push(format!("{}: {}", provider.name(), e));
                }
            }
        }

        Err(Error::ProvidersExhausted(failures.join("; ")))
    }

    /// Embed a search query. Same policy as [`embed`](Self::embed); a
    /// separate entry point so query-side callers read clearly.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        self.embed(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEmbeddingBackend;

    #[tokio::test]
    async fn empty_text_is_invalid_input() {
        let chain = EmbeddingChain::new(vec![Arc::new(MockEmbeddingBackend::new())]);
        let err = chain.embed("   ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn primary_success_short_circuits() {
        let primary = Arc::new(MockEmbeddingBackend::new());
        let secondary = Arc::new(MockEmbeddingBackend::new());
        let chain = EmbeddingChain::new(vec![primary.clone(), secondary.clone()]);

        chain.embed("hello").await.unwrap();
        assert_eq!(primary.call_count(), 1);
        assert_eq!(secondary.call_count(), 0);
    }

    #[tokio::test]
    async fn falls_back_to_secondary_on_primary_failure() {
        let primary = Arc::new(MockEmbeddingBackend::new().failing());
        let secondary = Arc::new(MockEmbeddingBackend::new());
        let chain = EmbeddingChain::new(vec![primary, secondary.clone()]);

        let vector = chain.embed("hello").await.unwrap();
        assert!(!vector.is_empty());
        assert_eq!(secondary.call_count(), 1);
    }

    #[tokio::test]
    async fn all_failures_surface_as_exhausted() {
        let chain = EmbeddingChain::new(vec![
            Arc::new(MockEmbeddingBackend::new().failing()),
            Arc::new(MockEmbeddingBackend::new().failing()),
        ]);
        let err = chain.embed("hello").await.unwrap_err();
        assert!(matches!(err, Error::ProvidersExhausted(_)));
    }

    #[tokio::test]
    async fn input_is_truncated_to_char_budget() {
        let primary = Arc::new(MockEmbeddingBackend::new());
        let chain = EmbeddingChain::new(vec![primary.clone()]).with_char_budget(10);

        chain.embed(&"x".repeat(100)).await.unwrap();
        let inputs = primary.inputs();
        assert_eq!(inputs[0].len(), 10);
    }
}
