//! Customer segment request and response types

use serde::{Deserialize, Serialize};

/// One result row: column name to JSON value, in select-list order
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Request body for `POST /api/segments/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentGenerateRequest {
    /// Natural-language description of the segment
    pub description: String,
}

/// Request body for `POST /api/segments/execute`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentExecuteRequest {
    /// SQL statement to run
    pub sql: String,
}

/// Response body for `POST /api/segments/execute`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentExecuteResponse {
    pub customers: Vec<Row>,
    pub count: usize,
}

impl SegmentExecuteResponse {
    pub fn new(customers: Vec<Row>) -> Self {
        let count = customers.len();
        Self { customers, count }
    }
}
