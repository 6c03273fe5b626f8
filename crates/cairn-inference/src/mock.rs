//! Deterministic mock backends for tests.
//!
//! Always compiled (not `cfg(test)`) so downstream crates' integration
//! tests can drive the pipeline and search engine without live providers.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use cairn_core::{Error, Result};

use crate::backend::{
    EmbeddingBackend, SummarizationBackend, TranscriptionBackend, VisionBackend,
};

/// Deterministic embedding from input bytes (FNV seed + LCG expansion).
/// Identical text always yields an identical vector.
pub fn seeded_vector(text: &str, dimension: usize) -> Vec<f32> {
    let mut state: u64 = 0xcbf2_9ce4_8422_2325;
    for b in text.bytes() {
        state ^= b as u64;
        state = state.wrapping_mul(0x0000_0100_0000_01b3);
    }
    (0..dimension)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            ((state >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

/// Mock embedding backend.
pub struct MockEmbeddingBackend {
    dimension: usize,
    fail_always: bool,
    fail_first: Mutex<u32>,
    fixed: HashMap<String, Vec<f32>>,
    calls: Mutex<Vec<String>>,
}

impl MockEmbeddingBackend {
    pub fn new() -> Self {
        Self {
            dimension: 8,
            fail_always: false,
            fail_first: Mutex::new(0),
            fixed: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Every call fails.
    pub fn failing(mut self) -> Self {
        self.fail_always = true;
        self
    }

    /// The first `n` calls fail, then calls succeed.
    pub fn failing_times(self, n: u32) -> Self {
        *self.fail_first.lock().unwrap() = n;
        self
    }

    /// Return a fixed vector for a specific input (overrides the seeded
    /// default). Lets tests place known texts near a known query.
    pub fn with_vector_for(mut self, input: impl Into<String>, vector: Vec<f32>) -> Self {
        self.fixed.insert(input.into(), vector);
        self
    }

    /// Number of embed calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Inputs received, in call order.
    pub fn inputs(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockEmbeddingBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.lock().unwrap().push(text.to_string());

        if self.fail_always {
            return Err(Error::Embedding("mock embedding failure".to_string()));
        }
        {
            let mut remaining = self.fail_first.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::Embedding("mock transient failure".to_string()));
            }
        }

        if let Some(vector) = self.fixed.get(text) {
            return Ok(vector.clone());
        }
        Ok(seeded_vector(text, self.dimension))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock vision backend.
pub struct MockVisionBackend {
    response: Option<String>,
    calls: Mutex<u32>,
}

impl MockVisionBackend {
    /// Always returns `response`.
    pub fn returning(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
            calls: Mutex::new(0),
        }
    }

    /// Always fails.
    pub fn failing() -> Self {
        Self {
            response: None,
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl VisionBackend for MockVisionBackend {
    async fn describe_image(
        &self,
        _image_data: &[u8],
        _mime_type: &str,
        _prompt: &str,
    ) -> Result<String> {
        *self.calls.lock().unwrap() += 1;
        match &self.response {
            Some(r) => Ok(r.clone()),
            None => Err(Error::Request("mock vision failure".to_string())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock transcription backend.
pub struct MockTranscriptionBackend {
    response: Option<String>,
}

impl MockTranscriptionBackend {
    pub fn returning(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
        }
    }

    pub fn failing() -> Self {
        Self { response: None }
    }
}

#[async_trait]
impl TranscriptionBackend for MockTranscriptionBackend {
    async fn transcribe(&self, _audio_data: &[u8], _mime_type: &str) -> Result<String> {
        match &self.response {
            Some(r) => Ok(r.clone()),
            None => Err(Error::Request("mock transcription failure".to_string())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock summarization backend.
pub struct MockSummarizationBackend {
    response: Option<String>,
}

impl MockSummarizationBackend {
    pub fn returning(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
        }
    }

    pub fn failing() -> Self {
        Self { response: None }
    }
}

#[async_trait]
impl SummarizationBackend for MockSummarizationBackend {
    async fn summarize(&self, _text: &str, _max_len: usize, _min_len: usize) -> Result<String> {
        match &self.response {
            Some(r) => Ok(r.clone()),
            None => Err(Error::Summarization("mock summarization failure".to_string())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
