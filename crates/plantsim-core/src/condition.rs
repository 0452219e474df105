//! Oscillating Good/Bad condition.
//!
//! The condition alternates strictly on every tick. Message and severity are
//! always those of the current state, retain stays `true`, and the
//! transition timestamp is refreshed on each flip. After flipping, the
//! condition raises an event tagged as a new-state transition.

use std::time::Duration;

use chrono::{DateTime, Utc};
use plantsim_model::ObjectHandle;
use plantsim_types::{ConditionSnapshot, ConditionState, Event, EventDetail, EventId, NodeId};
use tracing::debug;

use crate::config::ConditionConfig;
use crate::task::{EngineContext, SimulationTask, TickError, TickOutcome};

/// Two-state condition simulator.
#[derive(Debug)]
pub struct ConditionSimulator {
    handle: ObjectHandle,
    node_id: NodeId,
    display_name: String,
    config: ConditionConfig,
    interval: Duration,
    state: ConditionState,
    time: DateTime<Utc>,
}

impl ConditionSimulator {
    /// Create a condition in the Good state, stamped `created`.
    pub const fn new(
        handle: ObjectHandle,
        node_id: NodeId,
        display_name: String,
        config: ConditionConfig,
        interval: Duration,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            handle,
            node_id,
            display_name,
            config,
            interval,
            state: ConditionState::Good,
            time: created,
        }
    }

    /// Current state.
    pub const fn state(&self) -> ConditionState {
        self.state
    }

    /// Severity of the current state.
    pub const fn severity(&self) -> u16 {
        match self.state {
            ConditionState::Good => self.config.good_severity,
            ConditionState::Bad => self.config.bad_severity,
        }
    }

    /// Message of the current state.
    pub fn message(&self) -> &str {
        match self.state {
            ConditionState::Good => &self.config.good_message,
            ConditionState::Bad => &self.config.bad_message,
        }
    }

    /// Observable state.
    pub fn snapshot(&self) -> ConditionSnapshot {
        ConditionSnapshot {
            node_id: self.node_id.clone(),
            state: self.state,
            severity: self.severity(),
            message: self.message().to_owned(),
            retain: true,
            time: self.time,
        }
    }

    /// Flip the state and refresh the timestamp.
    pub fn transition(&mut self, now: DateTime<Utc>) -> ConditionSnapshot {
        self.state = self.state.toggled();
        self.time = now;
        self.snapshot()
    }

    fn event(&self, snapshot: ConditionSnapshot) -> Event {
        Event {
            id: EventId::new(),
            source: snapshot.node_id,
            source_name: self.display_name.clone(),
            severity: snapshot.severity,
            message: snapshot.message,
            retain: snapshot.retain,
            new_state: true,
            time: snapshot.time,
            detail: EventDetail::Condition {
                state: snapshot.state,
            },
        }
    }
}

impl SimulationTask for ConditionSimulator {
    fn name(&self) -> &'static str {
        "condition"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn tick(&mut self, ctx: &EngineContext) -> Result<TickOutcome, TickError> {
        ctx.space.object(self.handle)?;
        let snapshot = self.transition(ctx.clock.now());
        debug!(
            state = ?snapshot.state,
            severity = snapshot.severity,
            "Condition transitioned"
        );
        let event = self.event(snapshot);
        Ok(TickOutcome::Raised(ctx.notifier.notify(&event)))
    }
}
