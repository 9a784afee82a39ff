//! HTTP rendering of [`AppError`].
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{AppError, AppResult};

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::Transport { status, .. } => status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::BAD_GATEWAY),
        AppError::RemoteFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        AppError::MissingOutput { .. } => StatusCode::BAD_GATEWAY,
        AppError::TimedOut { .. } => StatusCode::REQUEST_TIMEOUT,
        AppError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        AppError::DuplicateKey(_) => StatusCode::CONFLICT,
        AppError::Storage(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let body = json!({
            "error": self.user_message(),
            "category": self.category().as_str(),
            "details": self.detail(),
            "retryable": self.is_retryable(),
        });
        (status, Json(body)).into_response()
    }
}

/// Unwrap a JSON body, turning axum's plain-text rejection into a
/// validation error with the usual body.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(format!("Invalid request body: {}", rejection.body_text())))
}
