//! # cairn-core
//!
//! Core types, traits, and abstractions for the cairn content-intelligence
//! library.
//!
//! This crate provides the foundational data structures and trait
//! definitions that other cairn crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod search;
pub mod temporal;
pub mod text;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::{
    ContentItem, FileCategory, Folder, ImageAnalysis, ProcessingOutcome, ProcessingState,
    VideoAnalysis,
};
pub use search::{
    cosine_similarity, SearchEntity, SearchMatchType, SearchOptions, SearchResult,
};
pub use temporal::DateRangeFilter;
pub use text::{clean_extracted_text, truncate_chars, truncate_with_marker};
pub use traits::ContentRepository;
