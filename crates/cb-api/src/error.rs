//! Maps domain errors onto HTTP statuses. The excluded UI layer owns
//! user-facing messaging; this layer only picks the status and relays
//! the error text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cb_core::error::CoreError;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoreError::PostNotFound(_)
            | CoreError::AccountNotFound(_)
            | CoreError::ItemNotFound(_)
            | CoreError::SessionNotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::InvalidReactionKind(_)
            | CoreError::Validation(_)
            | CoreError::NoMinigame(_) => StatusCode::BAD_REQUEST,
            CoreError::AlreadyPlayed { .. } | CoreError::AlreadyOwned(_) => StatusCode::CONFLICT,
            CoreError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed on a store error");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
