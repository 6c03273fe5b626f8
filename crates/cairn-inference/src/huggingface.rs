//! Hugging Face Inference API backends.
//!
//! The primary embedding provider plus summarization and image-captioning
//! backends. Calls are wrapped with the standard policy: explicit timeout,
//! bounded linear-backoff retries on transient "model loading" responses,
//! and an alternate endpoint shape for the same model on gone/not-found
//! responses. Permanent failures are never retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use tracing::{debug, warn};

use cairn_core::{defaults, Error, Result};

use crate::backend::{decode_embedding, EmbeddingBackend, SummarizationBackend, VisionBackend};

/// Hugging Face embedding backend (feature extraction).
pub struct HfEmbeddingBackend {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    model: String,
    alt_model: Option<String>,
    dimension: usize,
    max_retries: u32,
    retry_base_ms: u64,
    timeout_secs: u64,
}

impl HfEmbeddingBackend {
    /// Create a backend for `model` with the default policy.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_token: None,
            model: model.into(),
            alt_model: Some(defaults::HF_EMBED_ALT_MODEL.to_string()),
            dimension: defaults::EMBED_DIMENSION,
            max_retries: defaults::EMBED_MAX_RETRIES,
            retry_base_ms: defaults::EMBED_RETRY_BASE_MS,
            timeout_secs: defaults::EMBED_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables (`HF_API_BASE`, `HF_EMBED_MODEL`,
    /// `HF_API_TOKEN`).
    pub fn from_env() -> Self {
        let base_url = std::env::var(defaults::ENV_HF_API_BASE)
            .unwrap_or_else(|_| defaults::HF_API_BASE.to_string());
        let model = std::env::var(defaults::ENV_HF_EMBED_MODEL)
            .unwrap_or_else(|_| defaults::HF_EMBED_MODEL.to_string());
        let token = std::env::var(defaults::ENV_HF_API_TOKEN)
            .ok()
            .filter(|t| !t.is_empty());

        let mut backend = Self::new(base_url, model);
        backend.api_token = token;
        backend
    }

    /// Set the API token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Set the alternate model tried when the primary is permanently gone.
    pub fn with_alt_model(mut self, model: Option<String>) -> Self {
        self.alt_model = model;
        self
    }

    /// Override the retry policy (attempt `n` waits `n * base_ms`).
    pub fn with_retry_policy(mut self, max_retries: u32, base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_base_ms = base_ms;
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Call the inference API for one model, handling the transient-retry
    /// and endpoint-fallback policy.
    async fn embed_with_model(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let mut endpoint = format!("{}/models/{}", self.base_url, model);
        let mut switched_endpoint = false;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let mut request = self
                .client
                .post(&endpoint)
                .timeout(Duration::from_secs(self.timeout_secs))
                .json(&json!({ "inputs": text }));
            if let Some(token) = &self.api_token {
                request = request.bearer_auth(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::Embedding(format!("HF request failed: {}", e)))?;
            let status = response.status();

            // Transient: the model is cold and still loading.
            if status == StatusCode::SERVICE_UNAVAILABLE {
                let body = response.text().await.unwrap_or_default();
                if attempt <= self.max_retries {
                    let wait_ms = attempt as u64 * self.retry_base_ms;
                    warn!(
                        provider = "huggingface",
                        model,
                        attempt,
                        wait_ms,
                        "Model loading, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(wait_ms)).await;
                    continue;
                }
                return Err(Error::Embedding(format!(
                    "Model still loading after {} retries: {}",
                    self.max_retries, body
                )));
            }

            // Permanent gone/not-found: try the pipeline endpoint shape
            // once before giving up on this model.
            if (status == StatusCode::NOT_FOUND || status == StatusCode::GONE) && !switched_endpoint
            {
                switched_endpoint = true;
                attempt = 0;
                endpoint = format!("{}/pipeline/feature-extraction/{}", self.base_url, model);
                debug!(
                    provider = "huggingface",
                    model, "Switching to pipeline endpoint shape"
                );
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::Embedding(format!(
                    "HF returned {}: {}",
                    status, body
                )));
            }

            let value: serde_json::Value = response
                .json()
                .await
                .map_err(|e| Error::Embedding(format!("Failed to parse HF response: {}", e)))?;

            return decode_embedding(&value).filter(|v| !v.is_empty()).ok_or_else(|| {
                Error::Embedding("HF response did not decode to a numeric vector".to_string())
            });
        }
    }
}

#[async_trait]
impl EmbeddingBackend for HfEmbeddingBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match self.embed_with_model(&self.model, text).await {
            Ok(vector) => Ok(vector),
            Err(primary_err) => {
                let Some(alt) = &self.alt_model else {
                    return Err(primary_err);
                };
                warn!(
                    provider = "huggingface",
                    model = %self.model,
                    alt_model = %alt,
                    error = %primary_err,
                    "Primary model failed, trying alternate model"
                );
                self.embed_with_model(alt, text).await
            }
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}

/// Hugging Face summarization backend.
pub struct HfSummarizationBackend {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    model: String,
    timeout_secs: u64,
}

impl HfSummarizationBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_token: None,
            model: model.into(),
            timeout_secs: defaults::SUMMARY_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        let base_url = std::env::var(defaults::ENV_HF_API_BASE)
            .unwrap_or_else(|_| defaults::HF_API_BASE.to_string());
        let model = std::env::var(defaults::ENV_HF_SUMMARY_MODEL)
            .unwrap_or_else(|_| defaults::HF_SUMMARY_MODEL.to_string());
        let mut backend = Self::new(base_url, model);
        backend.api_token = std::env::var(defaults::ENV_HF_API_TOKEN)
            .ok()
            .filter(|t| !t.is_empty());
        backend
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }
}

/// Pull a summary string out of the response shapes summarization models
/// return: `[{"summary_text": ..}]`, `{"summary_text": ..}`, or a bare
/// string.
fn decode_summary(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Array(items) => items.first().and_then(decode_summary),
        serde_json::Value::Object(map) => map
            .get("summary_text")
            .and_then(|v| v.as_str())
            .map(String::from),
        serde_json::Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

#[async_trait]
impl SummarizationBackend for HfSummarizationBackend {
    async fn summarize(&self, text: &str, max_len: usize, min_len: usize) -> Result<String> {
        let url = format!("{}/models/{}", self.base_url, self.model);
        let mut request = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&json!({
                "inputs": text,
                "parameters": { "max_length": max_len, "min_length": min_len },
            }));
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Summarization(format!("HF request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Summarization(format!(
                "HF returned {}: {}",
                status, body
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Summarization(format!("Failed to parse response: {}", e)))?;

        decode_summary(&value)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::Summarization("Malformed summarization response".to_string()))
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}

/// Hugging Face image-captioning backend (secondary vision provider).
///
/// Captioning models take raw image bytes and no prompt; the structured
/// prompt is ignored and the caption becomes the plain description.
pub struct HfVisionBackend {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    model: String,
    timeout_secs: u64,
}

impl HfVisionBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_token: None,
            model: model.into(),
            timeout_secs: defaults::VISION_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        let base_url = std::env::var(defaults::ENV_HF_API_BASE)
            .unwrap_or_else(|_| defaults::HF_API_BASE.to_string());
        let model = std::env::var(defaults::ENV_HF_CAPTION_MODEL)
            .unwrap_or_else(|_| defaults::HF_CAPTION_MODEL.to_string());
        let mut backend = Self::new(base_url, model);
        backend.api_token = std::env::var(defaults::ENV_HF_API_TOKEN)
            .ok()
            .filter(|t| !t.is_empty());
        backend
    }
}

#[async_trait]
impl VisionBackend for HfVisionBackend {
    async fn describe_image(
        &self,
        image_data: &[u8],
        mime_type: &str,
        _prompt: &str,
    ) -> Result<String> {
        let url = format!("{}/models/{}", self.base_url, self.model);
        let mut request = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(image_data.to_vec());
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Request(format!("HF caption request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Request(format!("HF returned {}: {}", status, body)));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse caption: {}", e)))?;

        let caption = match &value {
            serde_json::Value::Array(items) => items
                .first()
                .and_then(|v| v.get("generated_text"))
                .and_then(|v| v.as_str())
                .map(String::from),
            serde_json::Value::Object(map) => map
                .get("generated_text")
                .and_then(|v| v.as_str())
                .map(String::from),
            _ => None,
        };

        caption
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::Serialization("Malformed caption response".to_string()))
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}
