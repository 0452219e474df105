//! Periodic plain-event emitter.

use std::time::Duration;

use plantsim_model::{ObjectHandle, VariableHandle};
use plantsim_types::{Event, EventDetail, EventId, NodeId, Value};
use tracing::debug;

use crate::task::{EngineContext, SimulationTask, TickError, TickOutcome};

/// Severity is clamped into this range.
const MIN_SEVERITY: u16 = 1;
const MAX_SEVERITY: u16 = 1000;

/// Emits a simulated event from an event-source node on every tick.
///
/// The severity is the wrapping counter's current value; the message names
/// the tick number.
#[derive(Debug)]
pub struct EventEmitter {
    handle: ObjectHandle,
    node_id: NodeId,
    display_name: String,
    severity_source: VariableHandle,
    interval: Duration,
    emitted: u64,
}

impl EventEmitter {
    /// Create an emitter for the node behind `handle`, reading its severity
    /// from `severity_source`.
    pub const fn new(
        handle: ObjectHandle,
        node_id: NodeId,
        display_name: String,
        severity_source: VariableHandle,
        interval: Duration,
    ) -> Self {
        Self {
            handle,
            node_id,
            display_name,
            severity_source,
            interval,
            emitted: 0,
        }
    }

    /// Number of events emitted so far.
    pub const fn emitted(&self) -> u64 {
        self.emitted
    }
}

fn severity_from(value: &Value) -> u16 {
    let raw = match value {
        Value::UInt32(v) => u16::try_from(*v).unwrap_or(MAX_SEVERITY),
        Value::Int32(v) => u16::try_from(*v).unwrap_or(MIN_SEVERITY),
        _ => MIN_SEVERITY,
    };
    raw.clamp(MIN_SEVERITY, MAX_SEVERITY)
}

impl SimulationTask for EventEmitter {
    fn name(&self) -> &'static str {
        "event_emitter"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn tick(&mut self, ctx: &EngineContext) -> Result<TickOutcome, TickError> {
        ctx.space.object(self.handle)?;
        let severity = severity_from(&ctx.space.read(self.severity_source)?);
        let number = self.emitted.saturating_add(1);

        let event = Event {
            id: EventId::new(),
            source: self.node_id.clone(),
            source_name: self.display_name.clone(),
            severity,
            message: format!("Simulated event #{number}"),
            retain: false,
            new_state: true,
            time: ctx.clock.now(),
            detail: EventDetail::Simulation,
        };
        let report = ctx.notifier.notify(&event);
        self.emitted = number;
        debug!(number, severity, "Simulated event emitted");
        Ok(TickOutcome::Raised(report))
    }
}
