//! Continuous-value simulators: wrapping counter, ramp, override percentage.
//!
//! All three follow a sawtooth: add a step each tick and snap back to the
//! floor once the ceiling is crossed. They differ in where the value lives.
//!
//! | Simulator | Value owned by | Published through |
//! |---|---|---|
//! | [`CounterSimulator`] | the simulator | internal store write |
//! | [`RampSimulator`] | the simulator | computed getter ([`SharedValue`]) |
//! | [`OverrideSimulator`] | the store | bounded store write, externally writable |

use std::time::Duration;

use plantsim_model::{SharedValue, VariableHandle};
use plantsim_types::{DataType, NodeId, Value};
use tracing::debug;

use crate::config::{CounterConfig, OverrideConfig, RampConfig};
use crate::task::{EngineContext, SimulationTask, TickError, TickOutcome};

// ---------------------------------------------------------------------------
// Step functions
// ---------------------------------------------------------------------------

/// Next counter value: `value + step`, or `floor` once that exceeds
/// `ceiling` (or overflows).
pub const fn wrap_counter(value: u32, step: u32, floor: u32, ceiling: u32) -> u32 {
    match value.checked_add(step) {
        Some(next) if next <= ceiling => next,
        _ => floor,
    }
}

/// Next sawtooth value: `value + step`, or `floor` once that exceeds
/// `ceiling`.
pub fn wrap_above(value: f64, step: f64, floor: f64, ceiling: f64) -> f64 {
    let next = value + step;
    if next > ceiling { floor } else { next }
}

/// Next ramp value: `value + step`, or `floor` once that reaches
/// `ceiling`.
pub fn wrap_at_or_above(value: f64, step: f64, floor: f64, ceiling: f64) -> f64 {
    let next = value + step;
    if next >= ceiling { floor } else { next }
}

// ---------------------------------------------------------------------------
// Wrapping counter
// ---------------------------------------------------------------------------

/// `UInt32` sawtooth counter; its value doubles as the event severity
/// payload.
#[derive(Debug)]
pub struct CounterSimulator {
    handle: VariableHandle,
    config: CounterConfig,
    interval: Duration,
    value: u32,
}

impl CounterSimulator {
    /// Create a counter starting at `config.floor`.
    pub const fn new(handle: VariableHandle, config: CounterConfig, interval: Duration) -> Self {
        let value = config.floor;
        Self {
            handle,
            config,
            interval,
            value,
        }
    }

    /// Current value.
    pub const fn value(&self) -> u32 {
        self.value
    }
}

impl SimulationTask for CounterSimulator {
    fn name(&self) -> &'static str {
        "counter"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn tick(&mut self, ctx: &EngineContext) -> Result<TickOutcome, TickError> {
        let next = wrap_counter(
            self.value,
            self.config.step,
            self.config.floor,
            self.config.ceiling,
        );
        ctx.space.write(self.handle, Value::UInt32(next), ctx.clock.now())?;
        self.value = next;
        debug!(value = next, "Counter ticked");
        Ok(TickOutcome::Updated)
    }
}

// ---------------------------------------------------------------------------
// Ramp
// ---------------------------------------------------------------------------

/// `Double` ramp exposed read-only through a computed getter.
#[derive(Debug)]
pub struct RampSimulator {
    handle: VariableHandle,
    cell: SharedValue,
    config: RampConfig,
    interval: Duration,
    value: f64,
}

impl RampSimulator {
    /// Create a ramp starting at `config.floor`, publishing into `cell`.
    pub fn new(
        handle: VariableHandle,
        cell: SharedValue,
        config: RampConfig,
        interval: Duration,
    ) -> Self {
        let value = config.floor;
        cell.set(Value::Double(value));
        Self {
            handle,
            cell,
            config,
            interval,
            value,
        }
    }

    /// Current value.
    pub const fn value(&self) -> f64 {
        self.value
    }
}

impl SimulationTask for RampSimulator {
    fn name(&self) -> &'static str {
        "ramp"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn tick(&mut self, ctx: &EngineContext) -> Result<TickOutcome, TickError> {
        // Fail before publishing if the node is disabled.
        ctx.space.variable(self.handle)?;
        let next = wrap_at_or_above(
            self.value,
            self.config.step,
            self.config.floor,
            self.config.ceiling,
        );
        self.value = next;
        self.cell.set(Value::Double(next));
        ctx.space.notify_changed(self.handle, ctx.clock.now())?;
        debug!(value = next, "Ramp ticked");
        Ok(TickOutcome::Updated)
    }
}

// ---------------------------------------------------------------------------
// Override percentage
// ---------------------------------------------------------------------------

/// `Double` percentage stepped through the bounded store write path.
///
/// The value lives in the store, so an external write moves the sawtooth:
/// the next tick steps from whatever the store currently holds.
#[derive(Debug)]
pub struct OverrideSimulator {
    handle: VariableHandle,
    node_id: NodeId,
    config: OverrideConfig,
    interval: Duration,
}

impl OverrideSimulator {
    /// Create the generator for the variable behind `handle`.
    pub const fn new(
        handle: VariableHandle,
        node_id: NodeId,
        config: OverrideConfig,
        interval: Duration,
    ) -> Self {
        Self {
            handle,
            node_id,
            config,
            interval,
        }
    }
}

impl SimulationTask for OverrideSimulator {
    fn name(&self) -> &'static str {
        "override_percentage"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn tick(&mut self, ctx: &EngineContext) -> Result<TickOutcome, TickError> {
        let current = match ctx.space.read(self.handle)? {
            Value::Double(v) => v,
            other => {
                return Err(TickError::UnexpectedType {
                    node: self.node_id.clone(),
                    expected: DataType::Double,
                    actual: other.data_type(),
                });
            }
        };
        let next = wrap_above(
            current,
            self.config.step,
            self.config.floor,
            self.config.ceiling,
        );
        ctx.space.write(self.handle, Value::Double(next), ctx.clock.now())?;
        debug!(value = next, "Override percentage ticked");
        Ok(TickOutcome::Updated)
    }
}
