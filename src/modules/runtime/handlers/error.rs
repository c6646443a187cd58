//! Error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crm_query_core::CrmError;
use crm_query_types::ErrorDetail;

/// A `CrmError` rendered as `{"detail": ...}` with the status its kind implies
#[derive(Debug)]
pub struct ApiError(pub CrmError);

impl From<CrmError> for ApiError {
    fn from(err: CrmError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorDetail::new(self.0.to_string()))).into_response()
    }
}
