//! Ollama backends: secondary embedding provider and primary vision
//! provider for local deployments.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use cairn_core::{defaults, Error, Result};

use crate::backend::{EmbeddingBackend, VisionBackend};

/// Ollama embedding backend (`/api/embed`).
///
/// Carries its own bounded retry policy and an alternate-model fallback;
/// as the last provider in the chain it gets one extra chance before the
/// chain reports exhaustion.
pub struct OllamaEmbeddingBackend {
    client: Client,
    base_url: String,
    model: String,
    alt_model: Option<String>,
    dimension: usize,
    max_retries: u32,
    retry_base_ms: u64,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbeddingBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            alt_model: Some(defaults::OLLAMA_EMBED_ALT_MODEL.to_string()),
            dimension: defaults::EMBED_DIMENSION,
            max_retries: defaults::EMBED_MAX_RETRIES,
            retry_base_ms: defaults::EMBED_RETRY_BASE_MS,
            timeout_secs: defaults::EMBED_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables (`OLLAMA_URL`, `OLLAMA_EMBED_MODEL`).
    pub fn from_env() -> Self {
        let base_url = std::env::var(defaults::ENV_OLLAMA_URL)
            .unwrap_or_else(|_| defaults::OLLAMA_URL.to_string());
        let model = std::env::var(defaults::ENV_OLLAMA_EMBED_MODEL)
            .unwrap_or_else(|_| defaults::OLLAMA_EMBED_MODEL.to_string());
        Self::new(base_url, model)
    }

    pub fn with_alt_model(mut self, model: Option<String>) -> Self {
        self.alt_model = model;
        self
    }

    pub fn with_retry_policy(mut self, max_retries: u32, base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_base_ms = base_ms;
        self
    }

    async fn embed_once(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: model.to_string(),
            input: vec![text.to_string()],
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        result
            .embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Embedding("Ollama returned an empty embedding".to_string()))
    }

    async fn embed_with_retries(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let mut last_err = None;
        for attempt in 1..=self.max_retries.max(1) {
            match self.embed_once(model, text).await {
                Ok(vector) => return Ok(vector),
                Err(e) => {
                    debug!(
                        provider = "ollama",
                        model,
                        attempt,
                        error = %e,
                        "Embedding attempt failed"
                    );
                    last_err = Some(e);
                    if attempt < self.max_retries {
                        let wait_ms = attempt as u64 * self.retry_base_ms;
                        tokio::time::sleep(Duration::from_millis(wait_ms)).await;
                    }
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| Error::Embedding("Ollama embedding failed".to_string())))
    }
}

#[async_trait]
impl EmbeddingBackend for OllamaEmbeddingBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match self.embed_with_retries(&self.model, text).await {
            Ok(vector) => Ok(vector),
            Err(primary_err) => {
                let Some(alt) = &self.alt_model else {
                    return Err(primary_err);
                };
                warn!(
                    provider = "ollama",
                    model = %self.model,
                    alt_model = %alt,
                    error = %primary_err,
                    "Primary model failed, trying alternate model"
                );
                self.embed_with_retries(alt, text).await
            }
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama vision backend (`/api/generate` with base64 images).
pub struct OllamaVisionBackend {
    client: Client,
    base_url: String,
    model: String,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    images: Vec<String>, // base64 encoded
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaVisionBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            timeout_secs: defaults::VISION_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables.
    /// Returns `None` if `OLLAMA_VISION_MODEL` is not set.
    pub fn from_env() -> Option<Self> {
        let model = std::env::var(defaults::ENV_OLLAMA_VISION_MODEL).ok()?;
        if model.is_empty() {
            return None;
        }
        let base_url = std::env::var(defaults::ENV_OLLAMA_URL)
            .unwrap_or_else(|_| defaults::OLLAMA_URL.to_string());
        Some(Self::new(base_url, model))
    }
}

#[async_trait]
impl VisionBackend for OllamaVisionBackend {
    async fn describe_image(
        &self,
        image_data: &[u8],
        _mime_type: &str,
        prompt: &str,
    ) -> Result<String> {
        use base64::Engine;
        let image_b64 = base64::engine::general_purpose::STANDARD.encode(image_data);

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            images: vec![image_b64],
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Vision request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Request(format!(
                "Vision API returned {}: {}",
                status, body
            )));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse vision response: {}", e)))?;

        Ok(result.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
