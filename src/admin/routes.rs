use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::admin::auth::AdminAuth;
use crate::error::AppError;
use crate::guard::{build_identifier, ClientIp, GuardStats};
use crate::state::AppState;

const BLOCKED_MESSAGE: &str = "Too many failed attempts. Please try again later.";

#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    token: String,
}

pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    Json(form): Json<LoginForm>,
) -> Result<Json<LoginResponse>, AppError> {
    if form.username.trim().is_empty() {
        return Err(AppError::BadRequest("Username is required".into()));
    }

    let guard = &state.login_guard;
    let identifier = build_identifier(&form.username, &ip);
    if guard.is_blocked(&identifier) {
        return Err(AppError::TooManyRequests {
            message: BLOCKED_MESSAGE.into(),
            retry_after_minutes: guard.remaining_block_time(&identifier),
        });
    }

    if form.username == state.admin_config.username
        && form.password == state.admin_config.password
    {
        guard.record_successful_attempt(&form.username, &ip);
        let session = state.sessions.lock().await.create(&form.username);
        tracing::info!("Admin {} signed in from {}", session.username, ip);
        return Ok(Json(LoginResponse {
            token: session.token,
        }));
    }

    let outcome = guard.record_failed_attempt(&form.username, &ip);
    if outcome.blocked {
        return Err(AppError::LoginBlocked {
            message: BLOCKED_MESSAGE.into(),
            block_time_minutes: outcome.block_time_minutes.unwrap_or_default(),
        });
    }
    Err(AppError::InvalidCredentials {
        remaining_attempts: outcome.remaining_attempts,
    })
}

pub async fn admin_logout(
    State(state): State<Arc<AppState>>,
    auth: AdminAuth,
) -> StatusCode {
    state.sessions.lock().await.remove(&auth.token);
    StatusCode::NO_CONTENT
}

pub async fn login_guard_stats(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
) -> Json<GuardStats> {
    Json(state.login_guard.stats())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{header, Request};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::AdminConfig;
    use crate::guard::{GuardConfig, LoginGuard};

    fn app() -> (Router, Arc<AppState>) {
        let guard = Arc::new(LoginGuard::new(GuardConfig {
            max_attempts: 3,
            block_duration_minutes: 15,
        }));
        let state = Arc::new(AppState::new(
            guard,
            AdminConfig {
                username: "admin".into(),
                password: "hunter2".into(),
            },
        ));
        (crate::admin::router().with_state(state.clone()), state)
    }

    fn login_request(
        username: &str,
        password: &str,
        forwarded_for: Option<&str>,
    ) -> Request<Body> {
        let mut builder =
            Request::post("/admin/login").header(header::CONTENT_TYPE, "application/json");
        if let Some(ip) = forwarded_for {
            builder = builder.header("x-forwarded-for", ip);
        }
        let mut request = builder
            .body(Body::from(
                json!({ "username": username, "password": password }).to_string(),
            ))
            .unwrap();
        let peer: SocketAddr = "10.1.1.1:40000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        request
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_failures_then_block() {
        let (app, state) = app();

        let (status, body) = send(&app, login_request("Admin", "nope", Some("1.2.3.4"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["remainingAttempts"], 2);

        let (status, body) = send(&app, login_request("admin", "nope", Some("1.2.3.4"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["remainingAttempts"], 1);

        let (status, body) = send(&app, login_request("admin", "nope", Some("1.2.3.4"))).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["blockTimeMinutes"], 15);
        assert_eq!(body["remainingMinutes"], Value::Null);

        // Correct password is rejected while blocked.
        let (status, body) = send(&app, login_request("admin", "hunter2", Some("1.2.3.4"))).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["remainingMinutes"], 15);

        // Another client address is tracked separately.
        let (status, _) = send(&app, login_request("admin", "hunter2", Some("5.6.7.8"))).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(state.login_guard.stats().currently_blocked, 1);
    }

    #[tokio::test]
    async fn test_success_resets_failures() {
        let (app, state) = app();

        send(&app, login_request("admin", "nope", None)).await;
        send(&app, login_request("admin", "nope", None)).await;
        assert!(!state.login_guard.is_empty());

        let (status, body) = send(&app, login_request("admin", "hunter2", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].is_string());
        assert!(state.login_guard.is_empty());
    }

    #[tokio::test]
    async fn test_empty_username_rejected() {
        let (app, state) = app();
        let (status, _) = send(&app, login_request("  ", "x", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.login_guard.is_empty());
    }

    #[tokio::test]
    async fn test_stats_requires_session() {
        let (app, _) = app();

        let request = Request::get("/admin/login-guard/stats").body(Body::empty()).unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        send(&app, login_request("admin", "nope", Some("9.9.9.9"))).await;
        let (_, body) = send(&app, login_request("admin", "hunter2", None)).await;
        let token = body["token"].as_str().unwrap().to_string();

        let request = Request::get("/admin/login-guard/stats")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "totalBlocked": 0, "currentlyBlocked": 0 }));

        let request = Request::post("/admin/logout")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let request = Request::get("/admin/login-guard/stats")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_failure_while_blocked_reports_block_duration() {
        let guard = Arc::new(LoginGuard::new(GuardConfig {
            max_attempts: 1,
            block_duration_minutes: 15,
        }));
        let state = Arc::new(AppState::new(
            guard,
            AdminConfig {
                username: "admin".into(),
                password: "hunter2".into(),
            },
        ));
        let app = crate::admin::router().with_state(state);

        let (status, body) = send(&app, login_request("admin", "nope", None)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["blockTimeMinutes"], 15);
        assert_eq!(body["remainingMinutes"], Value::Null);
    }
}
