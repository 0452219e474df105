//! Operator control state for runtime simulation management.
//!
//! This module provides shared state used by the scheduler and the
//! operator REST API. The operator can pause/resume ticking and trigger a
//! clean shutdown without restarting the process.
//!
//! # Architecture
//!
//! Pause is an [`AtomicBool`] read on every tick without locking. Stop is a
//! [`CancellationToken`]; the scheduler derives its own token from it, so a
//! stop request cancels every task at once.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Shared operator control state.
///
/// This struct is wrapped in [`Arc`](std::sync::Arc) and shared between
/// the scheduler and operator API handlers.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether ticking is currently paused.
    paused: AtomicBool,

    /// Cancelled once a stop has been requested.
    stop: CancellationToken,

    /// Wall-clock time when the engine started.
    started_at: DateTime<Utc>,
}

impl Default for OperatorState {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorState {
    /// Create a running, unpaused operator state.
    pub fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
            stop: CancellationToken::new(),
            started_at: Utc::now(),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Check whether ticking is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause ticking. Tasks keep their timers but skip ticks.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume ticking.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop.
    pub fn request_stop(&self) {
        self.stop.cancel();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Wait until a stop is requested.
    pub async fn stopped(&self) {
        self.stop.cancelled().await;
    }

    /// A token cancelled together with this operator's stop request.
    pub fn child_token(&self) -> CancellationToken {
        self.stop.child_token()
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    /// Return the wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Return elapsed seconds since start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    /// Snapshot for the operator API.
    pub fn status(&self) -> OperatorStatus {
        OperatorStatus {
            paused: self.is_paused(),
            stop_requested: self.is_stop_requested(),
            elapsed_seconds: self.elapsed_seconds(),
            started_at: self.started_at.to_rfc3339(),
        }
    }
}

/// JSON-serializable operator status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorStatus {
    /// Whether ticking is paused.
    pub paused: bool,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Elapsed wall-clock seconds since start.
    pub elapsed_seconds: u64,
    /// ISO 8601 timestamp of when the engine started.
    pub started_at: String,
}
