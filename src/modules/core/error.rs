//! Error types for the CRM query backend

use thiserror::Error;

/// How an error should be surfaced to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is unusable (missing user message, rejected SQL)
    InvalidRequest,
    /// The language model answered, but not in the expected shape
    InvalidFormat,
    /// Database, language model, or other backing service failure
    Infrastructure,
}

/// Main error type for CRM query operations
#[derive(Error, Debug)]
pub enum CrmError {
    /// Configuration loading error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed or incomplete client request
    #[error("{0}")]
    InvalidRequest(String),

    /// Model output that could not be parsed
    #[error("{0}")]
    InvalidFormat(String),

    /// SQL rejected by the segment execution policy
    #[error("SQL rejected by policy: {0}")]
    PolicyViolation(String),

    /// Database connection error
    #[error("Database error: {0}")]
    Database(String),

    /// Query execution error
    #[error("Query execution failed: {0}")]
    QueryExecution(String),

    /// Language model API error
    #[error("Language model error: {0}")]
    Llm(String),

    /// Prompt template error
    #[error("Template error: {0}")]
    Template(String),

    /// HTTP server error
    #[error("Server error: {0}")]
    Server(String),

    /// File system error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CrmError {
    /// Classify this error for the HTTP layer
    pub fn kind(&self) -> ErrorKind {
        match self {
            CrmError::Validation(_)
            | CrmError::InvalidRequest(_)
            | CrmError::PolicyViolation(_) => ErrorKind::InvalidRequest,
            CrmError::InvalidFormat(_) => ErrorKind::InvalidFormat,
            _ => ErrorKind::Infrastructure,
        }
    }

    /// Returns true if this error is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.kind() != ErrorKind::Infrastructure
    }

    /// Returns the appropriate HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidRequest | ErrorKind::InvalidFormat => 400,
            ErrorKind::Infrastructure => 500,
        }
    }
}

/// Result type alias using CrmError
pub type Result<T> = std::result::Result<T, CrmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            CrmError::InvalidFormat("bad".into()).kind(),
            ErrorKind::InvalidFormat
        );
        assert_eq!(
            CrmError::InvalidRequest("no user".into()).kind(),
            ErrorKind::InvalidRequest
        );
        assert_eq!(
            CrmError::PolicyViolation("DROP".into()).kind(),
            ErrorKind::InvalidRequest
        );
        assert_eq!(
            CrmError::Database("down".into()).kind(),
            ErrorKind::Infrastructure
        );
        assert_eq!(CrmError::Llm("429".into()).kind(), ErrorKind::Infrastructure);
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(CrmError::InvalidFormat("x".into()).status_code(), 400);
        assert_eq!(CrmError::InvalidRequest("x".into()).status_code(), 400);
        assert_eq!(CrmError::QueryExecution("x".into()).status_code(), 500);
        assert_eq!(CrmError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_error_messages() {
        let err = CrmError::InvalidRequest("No user message provided".into());
        assert_eq!(err.to_string(), "No user message provided");

        let err = CrmError::Database("connection refused".into());
        assert_eq!(err.to_string(), "Database error: connection refused");
        assert!(!err.is_client_error());
    }
}
