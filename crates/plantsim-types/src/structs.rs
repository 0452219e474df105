//! Core value objects: raised events, condition/alarm snapshots, and
//! historian records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ConditionState, LimitBand};
use crate::ids::{EventId, NodeId};
use crate::value::Value;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Kind-specific payload of an [`Event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventDetail {
    /// Raised by the oscillating condition after each state flip.
    Condition {
        /// Condition state after the transition.
        state: ConditionState,
    },
    /// Raised by a limit alarm evaluation.
    LimitAlarm {
        /// Band the input value was classified into.
        band: LimitBand,
        /// Band of the previous evaluation, if there was one.
        previous: Option<LimitBand>,
        /// Input value that was classified.
        input: f64,
        /// Variable the alarm monitors.
        input_node: NodeId,
    },
    /// Plain simulated event from an event notifier object.
    Simulation,
}

/// A transient notification delivered to subscribers.
///
/// Events have no storage inside the engine: they are built on a tick,
/// handed to the notifier, and dropped once delivery returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Unique event identifier.
    pub id: EventId,
    /// Node that raised the event.
    pub source: NodeId,
    /// Display name of the source node.
    pub source_name: String,
    /// Urgency (1-1000).
    pub severity: u16,
    /// Human-readable message.
    pub message: String,
    /// Whether the source remains of interest to operators.
    pub retain: bool,
    /// `true` when the event reports a state change, `false` when it
    /// re-asserts an unchanged state.
    pub new_state: bool,
    /// Time the source last transitioned.
    pub time: DateTime<Utc>,
    /// Kind-specific payload.
    pub detail: EventDetail,
}

// ---------------------------------------------------------------------------
// Condition / alarm snapshots
// ---------------------------------------------------------------------------

/// Observable state of an oscillating condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConditionSnapshot {
    /// Node identifier of the condition.
    pub node_id: NodeId,
    /// Current logical state.
    pub state: ConditionState,
    /// Current severity.
    pub severity: u16,
    /// Current message, consistent with `state`.
    pub message: String,
    /// Retain flag.
    pub retain: bool,
    /// Time of the last transition.
    pub time: DateTime<Utc>,
}

/// Observable state of a limit alarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AlarmSnapshot {
    /// Node identifier of the alarm.
    pub node_id: NodeId,
    /// Node identifier of the monitored input variable.
    pub input: NodeId,
    /// Band from the latest evaluation.
    pub band: LimitBand,
    /// Whether the alarm is active.
    pub active: bool,
    /// Retain flag.
    pub retain: bool,
    /// Severity attached to the current band.
    pub severity: u16,
    /// Time of the last band change.
    pub time: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Historian
// ---------------------------------------------------------------------------

/// One sample of a historized variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HistoricalRecord {
    /// Time the value was written.
    pub timestamp: DateTime<Utc>,
    /// The value written.
    pub value: Value,
}
