//! Model listing handler

use axum::Json;
use crm_query_types::{unix_timestamp, ModelsResponse};

/// Handler for the OpenAI model listing
pub struct ModelsHandler;

impl ModelsHandler {
    /// Handle GET /v1/models
    pub async fn list() -> Json<ModelsResponse> {
        Json(ModelsResponse::single(unix_timestamp()))
    }
}
