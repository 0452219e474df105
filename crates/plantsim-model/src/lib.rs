//! Information model for the plantsim engine.
//!
//! This crate owns the address space the simulators mutate and external
//! clients browse: variables with typed values and optional ranges,
//! condition/alarm/event-source nodes, the historian sink, and the
//! permission gate consulted for external writes.
//!
//! # Modules
//!
//! - [`access`] -- Credentials, user/role resolution, and the permission gate.
//! - [`address_space`] -- Node registry, handle resolution, read/write paths.
//! - [`bootstrap`] -- The demo address space driven by the bundled simulators.
//! - [`error`] -- [`ModelError`] and the typed [`WriteError`] rejection.
//! - [`historian`] -- Historian sink and the bounded ring buffer.
//! - [`variable`] -- Variable definitions and stored/computed backing.

pub mod access;
pub mod address_space;
pub mod bootstrap;
pub mod error;
pub mod historian;
pub mod variable;

// Re-export primary types at crate root.
pub use access::{
    AccessDecision, AllowAll, Credentials, DenyReason, PermissionGate, RoleGate, UserResolver,
    UserTable,
};
pub use address_space::{
    AddressSpace, AddressSpaceBuilder, NodeKind, ObjectHandle, ObjectNode, VariableHandle,
};
pub use bootstrap::{DemoParameters, DemoSpace, create_demo_address_space};
pub use error::{ModelError, WriteError};
pub use historian::{Historian, NullHistorian, RingHistorian};
pub use variable::{SharedValue, ValueSource, Variable, VariableDefinition};
