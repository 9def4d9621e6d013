use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::client_ip::build_identifier;
use super::clock::{Clock, SystemClock};

/// Unblocked records idle longer than this are reclaimed by [`LoginGuard::sweep`].
pub const EXPIRATION_WINDOW: Duration = Duration::hours(1);

/// Remaining attempts at or below this are reported in diagnostics.
const WARN_REMAINING_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy)]
pub struct GuardConfig {
    pub max_attempts: u32,
    pub block_duration_minutes: u32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        GuardConfig {
            max_attempts: 5,
            block_duration_minutes: 15,
        }
    }
}

#[derive(Debug, Clone)]
struct AttemptRecord {
    count: u32,
    first_attempt: DateTime<Utc>,
    last_attempt: DateTime<Utc>,
    blocked_until: Option<DateTime<Utc>>,
}

impl AttemptRecord {
    fn new(now: DateTime<Utc>) -> Self {
        AttemptRecord {
            count: 1,
            first_attempt: now,
            last_attempt: now,
            blocked_until: None,
        }
    }

    fn is_blocked_at(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until.is_some_and(|until| now < until)
    }

    fn block_lapsed_at(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until.is_some_and(|until| now >= until)
    }
}

/// Result of reporting a failed login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutcome {
    pub blocked: bool,
    pub remaining_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_time_minutes: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardStats {
    pub total_blocked: usize,
    pub currently_blocked: usize,
}

/// In-memory brute-force guard keyed by login identifier.
///
/// The whole ledger sits behind one mutex; every operation is a single
/// critical section and never awaits.
pub struct LoginGuard {
    attempts: Mutex<HashMap<String, AttemptRecord>>,
    config: GuardConfig,
    clock: Arc<dyn Clock>,
}

impl LoginGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: GuardConfig, clock: Arc<dyn Clock>) -> Self {
        LoginGuard {
            attempts: Mutex::new(HashMap::new()),
            config,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, AttemptRecord>> {
        // Records are plain data, a panic mid-update cannot leave them torn.
        self.attempts.lock().unwrap_or_else(|e| {
            tracing::warn!("Login guard lock was poisoned, recovering");
            e.into_inner()
        })
    }

    fn blocked_result(&self) -> AttemptOutcome {
        AttemptOutcome {
            blocked: true,
            remaining_attempts: 0,
            block_time_minutes: Some(self.config.block_duration_minutes),
        }
    }

    pub fn is_blocked(&self, identifier: &str) -> bool {
        let now = self.clock.now();
        let mut attempts = self.lock();
        let Some(until) = attempts.get(identifier).and_then(|r| r.blocked_until) else {
            return false;
        };
        if now < until {
            return true;
        }
        attempts.remove(identifier);
        false
    }

    /// Whole minutes left on the block, rounded up.
    pub fn remaining_block_time(&self, identifier: &str) -> u32 {
        let now = self.clock.now();
        let attempts = self.lock();
        let Some(until) = attempts.get(identifier).and_then(|r| r.blocked_until) else {
            return 0;
        };
        let remaining_ms = (until - now).num_milliseconds();
        if remaining_ms <= 0 {
            return 0;
        }
        let minutes = (remaining_ms + 59_999) / 60_000;
        u32::try_from(minutes).unwrap_or(u32::MAX)
    }

    pub fn record_failed_attempt(&self, login_input: &str, ip: &str) -> AttemptOutcome {
        let identifier = build_identifier(login_input, ip);
        let now = self.clock.now();
        let max_attempts = self.config.max_attempts;
        let mut attempts = self.lock();

        // A lapsed block expires here the same way `is_blocked` would expire it,
        // but the carried count is still at the limit and blocks again.
        if attempts
            .get(&identifier)
            .is_some_and(|r| r.block_lapsed_at(now))
        {
            if let Some(mut record) = attempts.remove(&identifier) {
                record.count = record.count.saturating_add(1);
                record.last_attempt = now;
                if record.count >= max_attempts {
                    return self.block(&mut attempts, identifier, record, login_input, ip, now);
                }
            }
        }

        let Some(record) = attempts.get_mut(&identifier) else {
            let record = AttemptRecord::new(now);
            if record.count >= max_attempts {
                return self.block(&mut attempts, identifier, record, login_input, ip, now);
            }
            attempts.insert(identifier, record);
            return AttemptOutcome {
                blocked: false,
                remaining_attempts: max_attempts - 1,
                block_time_minutes: None,
            };
        };

        let was_blocked = record.is_blocked_at(now);
        record.count = record.count.saturating_add(1);
        record.last_attempt = now;

        if was_blocked {
            return self.blocked_result();
        }

        if record.count >= max_attempts {
            let record = record.clone();
            return self.block(&mut attempts, identifier, record, login_input, ip, now);
        }

        let remaining_attempts = max_attempts - record.count;
        if remaining_attempts <= WARN_REMAINING_ATTEMPTS {
            tracing::debug!(
                "Failed login attempt {}/{} for {} (IP: {}) at {}",
                record.count,
                max_attempts,
                login_input,
                ip,
                record.last_attempt.to_rfc3339()
            );
        }

        AttemptOutcome {
            blocked: false,
            remaining_attempts,
            block_time_minutes: None,
        }
    }

    fn block(
        &self,
        attempts: &mut HashMap<String, AttemptRecord>,
        identifier: String,
        mut record: AttemptRecord,
        login_input: &str,
        ip: &str,
        now: DateTime<Utc>,
    ) -> AttemptOutcome {
        let until = now + Duration::minutes(i64::from(self.config.block_duration_minutes));
        record.blocked_until = Some(until);
        tracing::info!(
            "Login blocked for {} (IP: {}) after {} failed attempts since {}. Blocked until {}",
            login_input,
            ip,
            record.count,
            record.first_attempt.to_rfc3339(),
            until.to_rfc3339()
        );
        attempts.insert(identifier, record);
        self.blocked_result()
    }

    pub fn record_successful_attempt(&self, login_input: &str, ip: &str) {
        let identifier = build_identifier(login_input, ip);
        if self.lock().remove(&identifier).is_some() {
            tracing::info!(
                "Successful login for {} (IP: {}), resetting failed attempt counter",
                login_input,
                ip
            );
        }
    }

    /// Drop lapsed blocks and idle unblocked records. Returns how many went.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut attempts = self.lock();
        let before = attempts.len();
        attempts.retain(|_, record| match record.blocked_until {
            Some(until) => now < until,
            None => now - record.first_attempt <= EXPIRATION_WINDOW,
        });
        before - attempts.len()
    }

    /// Point-in-time counts; lapsed blocks still count toward `total_blocked`
    /// until swept.
    pub fn stats(&self) -> GuardStats {
        let now = self.clock.now();
        let attempts = self.lock();
        let mut stats = GuardStats {
            total_blocked: 0,
            currently_blocked: 0,
        };
        for record in attempts.values() {
            if record.blocked_until.is_some() {
                stats.total_blocked += 1;
                if record.is_blocked_at(now) {
                    stats.currently_blocked += 1;
                }
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
