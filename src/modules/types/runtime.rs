//! Runtime response bodies that are not part of the OpenAI contract

use serde::{Deserialize, Serialize};

/// Response body for `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"healthy"` or `"unhealthy"`
    pub status: String,
    /// `"connected"` or `"disconnected"`
    pub database: String,
}

impl HealthResponse {
    pub fn from_database(connected: bool) -> Self {
        if connected {
            Self {
                status: "healthy".to_string(),
                database: "connected".to_string(),
            }
        } else {
            Self {
                status: "unhealthy".to_string(),
                database: "disconnected".to_string(),
            }
        }
    }
}

/// Error body returned with 4xx/5xx responses
///
/// Uses the `{"detail": ...}` convention existing clients already parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// In-band error event sent when a stream fails after headers are committed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamError {
    pub error: String,
}
