//! Error types for the `plantsim-model` crate.
//!
//! [`ModelError`] covers address-space structure and resolution failures.
//! [`WriteError`] is the typed rejection returned by variable writes; none of
//! its variants leave the variable modified.

use plantsim_types::{DataType, NodeId};

use crate::address_space::NodeKind;

/// Errors raised while building or resolving the address space.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// No node is registered under the identifier.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// A node with the same identifier is already registered.
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// The identifier resolves to a node of a different kind.
    #[error("node {node} is a {actual:?}, expected a {expected:?}")]
    WrongNodeKind {
        /// The node that was resolved.
        node: NodeId,
        /// The kind the caller asked for.
        expected: NodeKind,
        /// The kind actually registered.
        actual: NodeKind,
    },

    /// The node exists but has been disabled at runtime.
    #[error("node disabled: {0}")]
    NodeDisabled(NodeId),

    /// A variable definition is internally inconsistent.
    #[error("invalid definition for {node}: {reason}")]
    InvalidDefinition {
        /// The offending node.
        node: NodeId,
        /// Explanation of what is wrong.
        reason: String,
    },

    /// A handle does not belong to this address space.
    #[error("stale handle (index {0})")]
    StaleHandle(usize),
}

/// Typed rejection of a variable write. State is unchanged in every case.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WriteError {
    /// The value lies outside the declared `[min, max]` range.
    #[error("BadOutOfRange: {value} is outside [{min}, {max}] for {node}")]
    OutOfRange {
        /// The variable written.
        node: NodeId,
        /// The rejected value.
        value: f64,
        /// Lower bound (inclusive).
        min: f64,
        /// Upper bound (inclusive).
        max: f64,
    },

    /// The value's tag does not match the declared data type.
    #[error("BadTypeMismatch: {node} expects {expected:?}, got {actual:?}")]
    TypeMismatch {
        /// The variable written.
        node: NodeId,
        /// Declared data type.
        expected: DataType,
        /// Tag of the rejected value.
        actual: DataType,
    },

    /// The variable is read-only or backed by a computed getter.
    #[error("BadNotWritable: {0}")]
    NotWritable(NodeId),

    /// The permission gate refused the write.
    #[error("BadUserAccessDenied: {user} may not write {node} ({reason})")]
    AccessDenied {
        /// The variable written.
        node: NodeId,
        /// User name the request was made as.
        user: String,
        /// Why the gate refused.
        reason: String,
    },

    /// The handle could not be used (node disabled or stale).
    #[error(transparent)]
    Model(#[from] ModelError),
}
