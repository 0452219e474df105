//! Shared fixtures for unit tests.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use plantsim_events::EventNotifier;
use plantsim_model::{AllowAll, NullHistorian};

use crate::clock::{Clock, ManualClock, SystemClock};
use crate::config::SimulationConfig;
use crate::plant::{DemoHandles, bootstrap};
use crate::task::EngineContext;

/// A manual clock parked at a fixed instant.
pub fn manual_clock() -> Arc<ManualClock> {
    let start = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();
    Arc::new(ManualClock::new(start))
}

/// Demo address space with default configuration and the system clock.
pub fn demo_context() -> (EngineContext, DemoHandles) {
    demo_context_with_clock(Arc::new(SystemClock))
}

/// Demo address space with default configuration and the given clock.
#[allow(clippy::unwrap_used)]
pub fn demo_context_with_clock(clock: Arc<dyn Clock>) -> (EngineContext, DemoHandles) {
    let config = SimulationConfig::default();
    let (space, handles) =
        bootstrap(&config, Arc::new(NullHistorian), Arc::new(AllowAll)).unwrap();
    let ctx = EngineContext {
        space: Arc::new(space),
        notifier: Arc::new(EventNotifier::new()),
        clock,
    };
    (ctx, handles)
}
