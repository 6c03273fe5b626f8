//! # cairn-pipeline
//!
//! The processing orchestrator: claims an item, runs extraction,
//! embedding, and summarization, and always persists the outcome so the
//! item's processed flag reflects that an attempt finished, not that
//! every stage succeeded.

pub mod processor;

pub use processor::{spawn_process, ContentProcessor};
