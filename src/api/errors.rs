use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::store::StorageIoError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The inbound payload could not be parsed as structured data.
    #[error("invalid request payload: {0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] StorageIoError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(e) => {
                tracing::error!(error = %e, "Storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
