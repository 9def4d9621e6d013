use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

const SESSION_DURATION: Duration = Duration::hours(1);

#[derive(Debug, Clone)]
pub struct AdminSession {
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    fn new(username: &str, now: DateTime<Utc>) -> Self {
        AdminSession {
            token: generate_session_token(),
            username: username.to_string(),
            expires_at: now + SESSION_DURATION,
        }
    }

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Admin sessions issued after a successful guarded login.
pub struct SessionStore {
    sessions: HashMap<String, AdminSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            sessions: HashMap::new(),
        }
    }

    pub fn create(&mut self, username: &str) -> AdminSession {
        self.create_at(username, Utc::now())
    }

    fn create_at(&mut self, username: &str, now: DateTime<Utc>) -> AdminSession {
        self.sessions.retain(|_, s| !s.is_expired_at(now));
        let session = AdminSession::new(username, now);
        self.sessions.insert(session.token.clone(), session.clone());
        session
    }

    pub fn validate(&self, token: &str) -> bool {
        self.validate_at(token, Utc::now())
    }

    fn validate_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        self.sessions
            .get(token)
            .is_some_and(|s| !s.is_expired_at(now))
    }

    pub fn remove(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }
}

fn generate_session_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.r#gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
