//! Health check handler

use axum::{extract::State, Json};
use crm_query_types::HealthResponse;

use crate::state::AppState;

/// Handler for liveness and database reachability
pub struct HealthHandler;

impl HealthHandler {
    /// Handle GET /health
    ///
    /// Always answers 200; the body reports whether the database responded.
    pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
        Json(HealthResponse::from_database(
            state.delegate.health_check().await,
        ))
    }
}
