//! # cairn-inference
//!
//! External AI capability backends for cairn: embedding, vision,
//! transcription, and summarization, each behind a trait with explicit
//! timeout, bounded retry, and fallback-chain policy.
//!
//! The [`EmbeddingChain`] is the only embedding entry point other crates
//! use; individual backends are exported for deployment wiring.

pub mod backend;
pub mod chain;
pub mod huggingface;
pub mod mock;
pub mod ollama;
pub mod summarizer;
pub mod whisper;

pub use backend::{
    decode_embedding, EmbeddingBackend, SummarizationBackend, TranscriptionBackend, VisionBackend,
};
pub use chain::EmbeddingChain;
pub use huggingface::{HfEmbeddingBackend, HfSummarizationBackend, HfVisionBackend};
pub use ollama::{OllamaEmbeddingBackend, OllamaVisionBackend};
pub use summarizer::Summarizer;
pub use whisper::WhisperBackend;
