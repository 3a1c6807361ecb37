//! Error types for huddle.

use thiserror::Error;

/// Common error type for huddle.
#[derive(Error, Debug)]
pub enum HuddleError {
    /// Database error.
    ///
    /// This is a generic database error that wraps errors from any database backend.
    /// Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// Feed fetch error (network, timeout, non-2xx status, unparsable document).
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Tag dictionary used before it was loaded.
    #[error("tag dictionary not loaded: {0}")]
    TagDictionary(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for operator input (seed files, config values).
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for HuddleError {
    fn from(e: sqlx::Error) -> Self {
        HuddleError::Database(e.to_string())
    }
}

/// Result type alias for huddle operations.
pub type Result<T> = std::result::Result<T, HuddleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = HuddleError::Fetch("HTTP error: 503".to_string());
        assert_eq!(err.to_string(), "fetch error: HTTP error: 503");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = HuddleError::NotFound("source".to_string());
        assert_eq!(err.to_string(), "source not found");
    }

    #[test]
    fn test_tag_dictionary_error_display() {
        let err = HuddleError::TagDictionary("call load_dictionary first".to_string());
        assert!(err.to_string().contains("tag dictionary not loaded"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HuddleError = io_err.into();
        assert!(matches!(err, HuddleError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(HuddleError::Validation("test".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
