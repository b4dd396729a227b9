//! JSON error response helpers.

use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    error_response(StatusCode::BAD_REQUEST, message)
}

pub fn bad_gateway(message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    error_response(StatusCode::BAD_GATEWAY, message)
}

pub fn internal_error(message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}

fn error_response(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}
