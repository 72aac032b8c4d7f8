//! Error types for spyglass.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using spyglass's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for spyglass operations.
///
/// Storage-layer failures are wrapped in [`Error::Database`]; everything
/// else is a typed domain error that the API layer maps to a stable
/// response code via [`Error::status_code`].
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Ingestion was called with no content
    #[error("Empty content submitted")]
    EmptyContent,

    /// The extraction collaborator rejected the document
    #[error("Not an article: {0}")]
    NotAnArticle(String),

    /// Article not found
    #[error("Article not found: {0}")]
    ArticleNotFound(Uuid),

    /// Highlight not found
    #[error("Highlight not found: {0}")]
    HighlightNotFound(Uuid),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(Uuid),

    /// User not found
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Highlight bounds violate `0 <= start < end <= len(content)`
    #[error("Invalid highlight range: start {start}, end {end}, content length {content_len}")]
    InvalidRange {
        start: i64,
        end: i64,
        content_len: i64,
    },

    /// Note references neither/both of article and highlight, an
    /// inconsistent pair, or a nonexistent entity
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// A uniqueness-violation race could not be resolved within the
    /// retry bound
    #[error("Conflict retries exhausted: {0}")]
    ConflictRetryExhausted(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable outward signal for the thin API layer.
    ///
    /// Every non-404 domain variant maps to its own 4xx code; the
    /// not-found family shares 404, and only storage and internal
    /// failures surface as 5xx.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::EmptyContent => 400,
            Error::NotAnArticle(_) => 415,
            Error::InvalidRange { .. } => 416,
            Error::InvalidReference(_) => 422,
            Error::ArticleNotFound(_)
            | Error::HighlightNotFound(_)
            | Error::NoteNotFound(_)
            | Error::UserNotFound(_) => 404,
            Error::ConflictRetryExhausted(_) => 409,
            Error::Database(_) | Error::Config(_) | Error::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_empty_content() {
        let err = Error::EmptyContent;
        assert_eq!(err.to_string(), "Empty content submitted");
    }

    #[test]
    fn test_error_display_article_not_found() {
        let id = Uuid::nil();
        let err = Error::ArticleNotFound(id);
        assert_eq!(err.to_string(), format!("Article not found: {}", id));
    }

    #[test]
    fn test_error_display_invalid_range() {
        let err = Error::InvalidRange {
            start: 5,
            end: 3,
            content_len: 10,
        };
        assert_eq!(
            err.to_string(),
            "Invalid highlight range: start 5, end 3, content length 10"
        );
    }

    #[test]
    fn test_error_display_invalid_reference() {
        let err = Error::InvalidReference("neither article nor highlight".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid reference: neither article nor highlight"
        );
    }

    #[test]
    fn test_error_display_conflict_retry_exhausted() {
        let err = Error::ConflictRetryExhausted("fingerprint sha256:abc".to_string());
        assert_eq!(
            err.to_string(),
            "Conflict retries exhausted: fingerprint sha256:abc"
        );
    }

    #[test]
    fn test_status_codes_are_distinct_outside_the_not_found_family() {
        assert_eq!(Error::EmptyContent.status_code(), 400);
        assert_eq!(Error::NotAnArticle("x".into()).status_code(), 415);
        assert_eq!(
            Error::InvalidRange {
                start: 5,
                end: 3,
                content_len: 10
            }
            .status_code(),
            416
        );
        assert_eq!(Error::InvalidReference("x".into()).status_code(), 422);
        assert_eq!(Error::ArticleNotFound(Uuid::nil()).status_code(), 404);
        assert_eq!(Error::HighlightNotFound(Uuid::nil()).status_code(), 404);
        assert_eq!(
            Error::ConflictRetryExhausted("x".into()).status_code(),
            409
        );
        assert_eq!(Error::Internal("x".into()).status_code(), 500);
    }
}
