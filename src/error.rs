use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Unauthorized(&'static str),
    InvalidCredentials { remaining_attempts: u32 },
    BadRequest(String),
    /// Rejected up front because the identity is already blocked.
    TooManyRequests { message: String, retry_after_minutes: u32 },
    /// This failure triggered or hit a block.
    LoginBlocked { message: String, block_time_minutes: u32 },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::InvalidCredentials { remaining_attempts } => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "error": "Invalid username or password.",
                    "remainingAttempts": remaining_attempts,
                }),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::TooManyRequests {
                message,
                retry_after_minutes,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": message, "remainingMinutes": retry_after_minutes }),
            ),
            AppError::LoginBlocked {
                message,
                block_time_minutes,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": message, "blockTimeMinutes": block_time_minutes }),
            ),
        };
        (status, Json(body)).into_response()
    }
}
