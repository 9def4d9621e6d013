//! Brute-force login protection.
//!
//! Failed logins are tracked per identifier (`lowercase(login):client_ip`).
//! Identifiers that fail too often are blocked for a fixed window, and a
//! background [`Reaper`] reclaims lapsed and idle records.

pub mod client_ip;
pub mod clock;
pub mod ledger;
pub mod reaper;

pub use client_ip::{build_identifier, ClientIp};
pub use ledger::{GuardConfig, GuardStats, LoginGuard};
pub use reaper::{Reaper, REAP_INTERVAL};
