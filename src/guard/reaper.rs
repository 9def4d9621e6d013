use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::ledger::LoginGuard;

pub const REAP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Background task sweeping the login guard on a fixed period.
///
/// Dropping a running reaper aborts its task; [`Reaper::stop`] lets the
/// current sweep finish first.
pub struct Reaper {
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl Reaper {
    pub fn start(guard: Arc<LoginGuard>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let cleaned = guard.sweep();
                        if cleaned > 0 {
                            tracing::debug!(
                                "Cleaned up {} expired login attempts, {} still tracked",
                                cleaned,
                                guard.len()
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::info!("Login attempt reaper shutting down");
                        break;
                    }
                }
            }
        });

        Reaper {
            shutdown_tx,
            handle: Some(handle),
        }
    }

    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                tracing::warn!("Login attempt reaper ended abnormally: {}", err);
            }
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
