//! Demo address space: the nodes the bundled simulators drive.
//!
//! Node identifiers are exposed as constants so that the one-time
//! resolution pass and external clients agree on them.

use std::sync::Arc;

use plantsim_types::{DataType, Role, Value, ValueRange};
use tracing::info;

use crate::access::PermissionGate;
use crate::address_space::{AddressSpace, AddressSpaceBuilder, NodeKind};
use crate::error::ModelError;
use crate::historian::Historian;
use crate::variable::{SharedValue, VariableDefinition};

/// Wrapping counter used as the event severity payload.
pub const COUNTER: &str = "Demo.Counter";
/// Bidirectional ramp; the level alarm's input.
pub const RAMP: &str = "Demo.Ramp";
/// Override percentage, writable by operators.
pub const OVERRIDE_PERCENTAGE: &str = "Demo.OverridePercentage";
/// Discrete on/off toggle.
pub const TOGGLE: &str = "Demo.Toggle";
/// Uniformly distributed random value.
pub const RANDOM: &str = "Demo.Random";
/// Oscillating Good/Bad condition.
pub const CONDITION: &str = "Demo.Condition";
/// Four-threshold limit alarm on the ramp.
pub const LEVEL_ALARM: &str = "Demo.LevelAlarm";
/// Object that emits plain periodic events.
pub const EVENT_NOTIFIER: &str = "Demo.EventNotifier";

/// Initial values and ranges for the demo nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoParameters {
    /// Initial counter value.
    pub counter_initial: u32,
    /// Initial ramp value.
    pub ramp_initial: f64,
    /// Initial override percentage.
    pub override_initial: f64,
    /// Inclusive range of the override percentage.
    pub override_range: ValueRange,
    /// Inclusive range of the random value.
    pub random_range: ValueRange,
}

/// The assembled demo model plus the cell backing the computed ramp.
#[derive(Debug)]
pub struct DemoSpace {
    /// The address space.
    pub space: AddressSpace,
    /// Value cell the ramp simulator publishes into.
    pub ramp: SharedValue,
}

/// Build the demo address space.
///
/// # Errors
///
/// Returns a [`ModelError`] if an initial value violates its definition.
pub fn create_demo_address_space(
    params: &DemoParameters,
    historian: Arc<dyn Historian>,
    gate: Arc<dyn PermissionGate>,
) -> Result<DemoSpace, ModelError> {
    let ramp = SharedValue::new(Value::Double(params.ramp_initial));
    let mut builder = AddressSpaceBuilder::new();

    builder
        .add_variable(
            VariableDefinition::new(COUNTER, "Counter", DataType::UInt32).historized(),
            Value::UInt32(params.counter_initial),
        )?
        .add_computed_variable(
            VariableDefinition::new(RAMP, "Ramp", DataType::Double).historized(),
            Arc::new(ramp.clone()),
        )?
        .add_variable(
            VariableDefinition::new(OVERRIDE_PERCENTAGE, "Override Percentage", DataType::Double)
                .with_range(params.override_range)
                .writable_by(&[Role::Operator, Role::Engineer])
                .historized(),
            Value::Double(params.override_initial),
        )?
        .add_variable(
            VariableDefinition::new(TOGGLE, "Toggle", DataType::Boolean)
                .writable_by(&[Role::Operator])
                .historized(),
            Value::Boolean(false),
        )?
        .add_variable(
            VariableDefinition::new(RANDOM, "Random", DataType::Double)
                .with_range(params.random_range),
            Value::Double(params.random_range.min),
        )?
        .add_object(CONDITION, "Condition", NodeKind::Condition)?
        .add_object(LEVEL_ALARM, "Level Alarm", NodeKind::Alarm)?
        .add_object(EVENT_NOTIFIER, "Event Notifier", NodeKind::EventSource)?;

    let space = builder.build_with(historian, gate);
    info!(nodes = space.node_count(), "Demo address space created");
    Ok(DemoSpace { space, ramp })
}
