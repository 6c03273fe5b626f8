//! # cairn-search
//!
//! The hybrid search engine: lexical substring scoring fused with
//! embedding cosine similarity, plus the single-signal content, filename,
//! and tag searches.

pub mod engine;

pub use engine::SearchEngine;
