//! Unified error type for indexing, persistence and ranked lookup.

use thiserror::Error;

/// Coarse error category shown to the user in front of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Filesystem,
    ServiceAuth,
    ServiceTransient,
    ServicePermanent,
    Parsing,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Input => "Invalid input",
            ErrorKind::Filesystem => "File system error",
            ErrorKind::ServiceAuth => "Authentication failed",
            ErrorKind::ServiceTransient => "Service temporarily unavailable",
            ErrorKind::ServicePermanent => "Ranking service error",
            ErrorKind::Parsing => "Response parsing error",
        }
    }
}

/// All errors that can occur in docfind operations.
#[derive(Error, Debug)]
pub enum FinderError {
    /// Blank query, blank index name, or similar caller mistake
    #[error("{0}")]
    InvalidInput(String),

    /// I/O error (file read/write, directory access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary index (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// JSON index (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to load an index from disk
    #[error("Failed to load index from {path}: {message}")]
    IndexLoad { path: String, message: String },

    /// Failed to save index to disk
    #[error("Failed to save index: {0}")]
    SaveFailed(String),

    /// Nothing was crawled or loaded
    #[error("No documents to save")]
    EmptyCatalog,

    /// Missing or rejected API credential
    #[error("{message}")]
    ServiceAuth { message: String },

    /// Retry budget exhausted on rate-limit or unavailability
    #[error("giving up after {attempts} attempt(s): {message}")]
    ServiceTransient { attempts: u32, message: String },

    /// Malformed request, blocked or truncated generation, unexpected payload
    #[error("{message}")]
    ServicePermanent {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Answer text could not be turned into a result list
    #[error("could not interpret answer: {message}")]
    Parsing { message: String },
}

impl FinderError {
    pub fn permanent(message: impl Into<String>) -> Self {
        FinderError::ServicePermanent {
            message: message.into(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FinderError::InvalidInput(_) => ErrorKind::Input,
            FinderError::Io(_)
            | FinderError::Serialization(_)
            | FinderError::Json(_)
            | FinderError::IndexLoad { .. }
            | FinderError::SaveFailed(_)
            | FinderError::EmptyCatalog => ErrorKind::Filesystem,
            FinderError::ServiceAuth { .. } => ErrorKind::ServiceAuth,
            FinderError::ServiceTransient { .. } => ErrorKind::ServiceTransient,
            FinderError::ServicePermanent { .. } => ErrorKind::ServicePermanent,
            FinderError::Parsing { .. } => ErrorKind::Parsing,
        }
    }

    /// The single line handed to the collaborator: `"<category>: <message>"`.
    pub fn user_message(&self) -> String {
        format!("{}: {}", self.kind().label(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = FinderError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        assert!(err.to_string().contains("I/O error"));
        assert!(err.to_string().contains("file not found"));
        assert_eq!(err.kind(), ErrorKind::Filesystem);
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: FinderError = io_err.into();
        assert!(matches!(err, FinderError::Io(_)));
    }

    #[test]
    fn test_transient_display_mentions_attempts() {
        let err = FinderError::ServiceTransient {
            attempts: 3,
            message: "HTTP 429".to_string(),
        };
        assert!(err.to_string().contains("3 attempt"));
        assert_eq!(err.kind(), ErrorKind::ServiceTransient);
    }

    #[test]
    fn test_user_message_prefixes_category() {
        let err = FinderError::ServiceAuth {
            message: "API key is missing".to_string(),
        };
        assert_eq!(err.user_message(), "Authentication failed: API key is missing");

        let err = FinderError::InvalidInput("Please enter a question.".to_string());
        assert_eq!(err.user_message(), "Invalid input: Please enter a question.");
    }

    #[test]
    fn test_permanent_keeps_source() {
        use std::error::Error as _;
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "bad body");
        let err = FinderError::ServicePermanent {
            message: "unexpected response shape".to_string(),
            source: Some(Box::new(cause)),
        };
        assert!(err.source().is_some());
        assert!(FinderError::permanent("x").source().is_none());
    }

    #[test]
    fn test_parsing_user_message() {
        let err = FinderError::Parsing {
            message: "no document path in answer".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Parsing);
        assert_eq!(
            err.user_message(),
            "Response parsing error: could not interpret answer: no document path in answer"
        );
    }

    #[test]
    fn test_index_load_display() {
        let err = FinderError::IndexLoad {
            path: "/tmp/docs.json".to_string(),
            message: "truncated".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/docs.json"));
        assert!(msg.contains("truncated"));
    }
}
