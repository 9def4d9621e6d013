use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod routes;
pub mod session;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/login", post(routes::admin_login))
        .route("/admin/logout", post(routes::admin_logout))
        .route("/admin/login-guard/stats", get(routes::login_guard_stats))
}
