use std::sync::Arc;

use tokio::sync::Mutex;

use crate::admin::session::SessionStore;
use crate::config::AdminConfig;
use crate::guard::LoginGuard;

pub struct AppState {
    pub login_guard: Arc<LoginGuard>,
    pub admin_config: AdminConfig,
    pub sessions: Mutex<SessionStore>,
}

impl AppState {
    pub fn new(login_guard: Arc<LoginGuard>, admin_config: AdminConfig) -> Self {
        AppState {
            login_guard,
            admin_config,
            sessions: Mutex::new(SessionStore::new()),
        }
    }
}
