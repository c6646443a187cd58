//! OpenAI-compatible model listing types

use serde::{Deserialize, Serialize};

use crate::chat::DEFAULT_MODEL_ID;

/// Owner reported for the advertised model
pub const MODEL_OWNER: &str = "crm-backend";

/// A single model descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
}

/// Response body for `GET /v1/models`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub object: String,
    pub data: Vec<ModelInfo>,
}

impl ModelsResponse {
    /// The one model this backend serves
    pub fn single(created: i64) -> Self {
        Self {
            object: "list".to_string(),
            data: vec![ModelInfo {
                id: DEFAULT_MODEL_ID.to_string(),
                object: "model".to_string(),
                created,
                owned_by: MODEL_OWNER.to_string(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_model_listing() {
        let value = serde_json::to_value(ModelsResponse::single(1700000000)).unwrap();
        assert_eq!(value["object"], "list");
        assert_eq!(value["data"].as_array().unwrap().len(), 1);
        assert_eq!(value["data"][0]["id"], "crm-sql-engine");
        assert_eq!(value["data"][0]["object"], "model");
        assert_eq!(value["data"][0]["owned_by"], "crm-backend");
        assert_eq!(value["data"][0]["created"], 1700000000);
    }
}
