//! Error types for cairn.

use thiserror::Error;

/// Result type alias using cairn's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cairn operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// File entity not found
    #[error("File not found: {0}")]
    FileNotFound(uuid::Uuid),

    /// Text extraction failed (non-fatal, recorded as a diagnostic)
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Every provider in a fallback chain failed
    #[error("All embedding providers exhausted: {0}")]
    ProvidersExhausted(String),

    /// Summarization failed (always absorbed by the truncation fallback)
    #[error("Summarization error: {0}")]
    Summarization(String),

    /// Search operation failed
    #[error("Search error: {0}")]
    Search(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_file_not_found() {
        let id = Uuid::nil();
        let err = Error::FileNotFound(id);
        assert_eq!(err.to_string(), format!("File not found: {}", id));
    }

    #[test]
    fn test_error_display_extraction() {
        let err = Error::Extraction("unreadable pdf".to_string());
        assert_eq!(err.to_string(), "Extraction error: unreadable pdf");
    }

    #[test]
    fn test_error_display_embedding() {
        let err = Error::Embedding("failed to generate".to_string());
        assert_eq!(err.to_string(), "Embedding error: failed to generate");
    }

    #[test]
    fn test_error_display_providers_exhausted() {
        let err = Error::ProvidersExhausted("hf, ollama".to_string());
        assert_eq!(
            err.to_string(),
            "All embedding providers exhausted: hf, ollama"
        );
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("empty query".to_string());
        assert_eq!(err.to_string(), "Invalid input: empty query");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
