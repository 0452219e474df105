//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the live address space the REST endpoints read and
//! write, the event journal fed by the engine's notifier, the broadcast
//! channel behind `/ws/events`, the clock stamping external writes, and
//! optional handles to the historian, operator controls, and scheduler
//! counters.

use std::sync::Arc;

use plantsim_core::clock::{Clock, SystemClock};
use plantsim_core::operator::OperatorState;
use plantsim_core::scheduler::SchedulerStats;
use plantsim_model::{AddressSpace, RingHistorian};
use plantsim_types::Event;
use tokio::sync::broadcast;

use crate::journal::{EventJournal, JournalSubscriber};

/// Capacity of the broadcast channel for live events.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
pub const BROADCAST_CAPACITY: usize = 1024;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The address space served by the variable endpoints.
    pub space: Arc<AddressSpace>,
    /// Broadcast sender for live events.
    pub tx: broadcast::Sender<Event>,
    /// Recently delivered events and derived condition/alarm state.
    pub journal: Arc<EventJournal>,
    /// Historian behind `/api/variables/{id}/history`.
    pub historian: Option<Arc<RingHistorian>>,
    /// Shared operator control state (present when the engine is running).
    pub operator_state: Option<Arc<OperatorState>>,
    /// Per-task scheduler counters.
    pub scheduler_stats: Option<SchedulerStats>,
    /// Timestamps external writes for the historian.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create a state over `space` with an empty journal of the given size.
    pub fn new(space: Arc<AddressSpace>, event_log_size: usize) -> Self {
        Self::with_capacity(space, event_log_size, BROADCAST_CAPACITY)
    }

    /// Like [`AppState::new`] with an explicit live-event channel capacity
    /// (at least one).
    pub fn with_capacity(
        space: Arc<AddressSpace>,
        event_log_size: usize,
        broadcast_capacity: usize,
    ) -> Self {
        let (tx, _) = broadcast::channel(broadcast_capacity.max(1));
        Self {
            space,
            tx,
            journal: Arc::new(EventJournal::new(event_log_size)),
            historian: None,
            operator_state: None,
            scheduler_stats: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use the engine's clock for external writes.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attach the historian.
    #[must_use]
    pub fn with_historian(mut self, historian: Arc<RingHistorian>) -> Self {
        self.historian = Some(historian);
        self
    }

    /// Attach operator control state.
    #[must_use]
    pub fn with_operator(mut self, operator: Arc<OperatorState>) -> Self {
        self.operator_state = Some(operator);
        self
    }

    /// Attach scheduler counters.
    #[must_use]
    pub fn with_scheduler_stats(mut self, stats: SchedulerStats) -> Self {
        self.scheduler_stats = Some(stats);
        self
    }

    /// Subscriber to register with the engine's notifier so this state
    /// sees every event.
    pub fn subscriber(&self) -> JournalSubscriber {
        JournalSubscriber::new(Arc::clone(&self.journal), self.tx.clone())
    }

    /// Subscribe to the live event channel.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl core::fmt::Debug for AppState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppState")
            .field("nodes", &self.space.node_count())
            .field("events", &self.journal.len())
            .field("historian", &self.historian.is_some())
            .field("operator", &self.operator_state.is_some())
            .finish_non_exhaustive()
    }
}
