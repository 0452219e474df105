//! Enumeration types for the plantsim information model.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Conditions and alarms
// ---------------------------------------------------------------------------

/// Logical state of an oscillating condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ConditionState {
    /// The monitored situation is acceptable (low severity band).
    Good,
    /// The monitored situation needs attention (high severity band).
    Bad,
}

impl ConditionState {
    /// The opposite state.
    pub const fn toggled(self) -> Self {
        match self {
            Self::Good => Self::Bad,
            Self::Bad => Self::Good,
        }
    }
}

/// One of the five threshold-delimited ranges a limit alarm input can fall
/// into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum LimitBand {
    /// Below the `lowlow` threshold.
    LowLow,
    /// In `[lowlow, low)`.
    Low,
    /// In `[low, high]`; the alarm is inactive.
    Normal,
    /// In `(high, highhigh]`.
    High,
    /// Above the `highhigh` threshold.
    HighHigh,
}

impl LimitBand {
    /// Whether the alarm is active in this band.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Normal)
    }
}

// ---------------------------------------------------------------------------
// Access control
// ---------------------------------------------------------------------------

/// Whether external clients may write a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum AccessLevel {
    /// Readable only.
    ReadOnly,
    /// Readable and writable, subject to the permission gate.
    ReadWrite,
}

/// Role granted to an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Unauthenticated access.
    Anonymous,
    /// Any user whose credentials were accepted.
    AuthenticatedUser,
    /// Plant operator.
    Operator,
    /// Engineering staff.
    Engineer,
    /// Full access, implies every other role.
    Admin,
}
