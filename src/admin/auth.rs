use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let value = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AppError::Unauthorized("Missing Authorization header"))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header value"))?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AppError::Unauthorized("Expected Bearer token"))
}

/// A request carrying a live admin session token.
pub struct AdminAuth {
    pub token: String,
}

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        if !state.sessions.lock().await.validate(token) {
            return Err(AppError::Unauthorized("Invalid or expired session"));
        }
        Ok(AdminAuth {
            token: token.to_string(),
        })
    }
}
