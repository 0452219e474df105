//! Shared type definitions for the plantsim information model.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries: node identifiers, tagged values, events, and snapshots.
//! Types flow downstream to `TypeScript` via `ts-rs` for dashboards.
//!
//! # Modules
//!
//! - [`ids`] -- Node identifiers and UUID wrappers
//! - [`value`] -- Tagged [`Value`] union, [`DataType`], and [`ValueRange`]
//! - [`enums`] -- Condition states, alarm bands, access levels, roles
//! - [`structs`] -- Events, condition/alarm snapshots, historian records

pub mod enums;
pub mod ids;
pub mod structs;
pub mod value;

// Re-export all public types at crate root for convenience.
pub use enums::{AccessLevel, ConditionState, LimitBand, Role};
pub use ids::{EventId, NodeId, SubscriberId};
pub use structs::{AlarmSnapshot, ConditionSnapshot, Event, EventDetail, HistoricalRecord};
pub use value::{DataType, Value, ValueRange};
