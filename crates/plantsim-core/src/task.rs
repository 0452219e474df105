//! The unit the scheduler drives: a periodic [`SimulationTask`].
//!
//! Each simulator owns its state as plain fields and implements
//! [`SimulationTask::tick`], which performs one bounded unit of work and
//! returns. Ticks never await; anything that could block is handed to a
//! channel by the event subscribers.

use std::sync::Arc;
use std::time::Duration;

use plantsim_events::{DeliveryReport, EventNotifier};
use plantsim_model::{AddressSpace, ModelError, WriteError};
use plantsim_types::{DataType, NodeId};

use crate::clock::Clock;

/// Errors a single tick can return. The scheduler logs them and skips the
/// tick; the task keeps running.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A handle could not be used (node disabled at runtime).
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The store rejected the simulator's write.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// A variable held a value of an unexpected type.
    #[error("{node} holds a {actual:?}, expected {expected:?}")]
    UnexpectedType {
        /// Variable that was read.
        node: NodeId,
        /// Type the simulator needs.
        expected: DataType,
        /// Type actually found.
        actual: DataType,
    },

    /// An input value cannot be evaluated (NaN or infinite).
    #[error("{node} produced a non-finite value")]
    NonFinite {
        /// Variable that was read.
        node: NodeId,
    },

    /// A sampling range cannot be drawn from.
    #[error("cannot sample {node}: {reason}")]
    InvalidRange {
        /// Variable being sampled.
        node: NodeId,
        /// Why the range was refused.
        reason: String,
    },

    /// The tick panicked; the panic was caught at the task boundary.
    #[error("tick panicked: {message}")]
    Panicked {
        /// Panic payload, if it was a string.
        message: String,
    },
}

/// What a successful tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A variable value changed; no event was raised.
    Updated,
    /// An event was raised and relayed to subscribers.
    Raised(DeliveryReport),
    /// Evaluation ran but nothing needed to be reported.
    Quiet,
}

/// Shared collaborators every task ticks against.
#[derive(Clone)]
pub struct EngineContext {
    /// The live address space.
    pub space: Arc<AddressSpace>,
    /// Relay to event subscribers.
    pub notifier: Arc<EventNotifier>,
    /// Timestamp source.
    pub clock: Arc<dyn Clock>,
}

impl core::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EngineContext")
            .field("space", &self.space)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

/// A periodic simulator.
pub trait SimulationTask: Send {
    /// Short name used in logs and statistics.
    fn name(&self) -> &str;

    /// Fixed tick period.
    fn interval(&self) -> Duration;

    /// Perform one tick.
    ///
    /// # Errors
    ///
    /// Returns a [`TickError`] if the tick could not complete; the task's own
    /// state is left as it was before the tick.
    fn tick(&mut self, ctx: &EngineContext) -> Result<TickOutcome, TickError>;
}
