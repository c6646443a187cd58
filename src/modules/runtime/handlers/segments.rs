//! Customer segment handlers

use axum::{extract::State, Json};
use crm_query_core::Segment;
use crm_query_types::{SegmentExecuteRequest, SegmentExecuteResponse, SegmentGenerateRequest};
use tracing::info;

use super::error::ApiError;
use crate::state::AppState;

/// Handler for segment generation and execution
pub struct SegmentHandler;

impl SegmentHandler {
    /// Handle POST /api/segments/generate
    pub async fn generate(
        State(state): State<AppState>,
        Json(request): Json<SegmentGenerateRequest>,
    ) -> Result<Json<Segment>, ApiError> {
        let segment = state.delegate.generate_segment(&request.description).await?;
        Ok(Json(segment))
    }

    /// Handle POST /api/segments/execute
    pub async fn execute(
        State(state): State<AppState>,
        Json(request): Json<SegmentExecuteRequest>,
    ) -> Result<Json<SegmentExecuteResponse>, ApiError> {
        let customers = state.delegate.execute_segment_sql(&request.sql).await?;
        info!("Segment matched {} customers", customers.len());
        Ok(Json(SegmentExecuteResponse::new(customers)))
    }
}
