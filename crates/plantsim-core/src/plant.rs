//! Startup assembly: address space, one-time handle resolution, and the
//! simulator set.
//!
//! Every identifier the simulators use is resolved exactly once, here. A
//! resolution failure is a [`SetupError`] and halts startup; after this
//! point ticks only ever see typed handles.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use plantsim_model::bootstrap::{
    CONDITION, COUNTER, EVENT_NOTIFIER, LEVEL_ALARM, OVERRIDE_PERCENTAGE, RAMP, RANDOM, TOGGLE,
};
use plantsim_model::{
    AddressSpace, DemoSpace, Historian, ModelError, NodeKind, ObjectHandle, PermissionGate,
    RingHistorian, SharedValue, UserTable, VariableHandle, create_demo_address_space,
};
use plantsim_types::NodeId;
use tracing::info;

use crate::alarm::{AlarmBinding, AlarmSeverities, LimitAlarm};
use crate::clock::Clock;
use crate::condition::ConditionSimulator;
use crate::config::{ConfigError, SimulationConfig, UserConfig};
use crate::discrete::{RandomSimulator, ToggleSimulator};
use crate::emitter::EventEmitter;
use crate::sawtooth::{CounterSimulator, OverrideSimulator, RampSimulator};
use crate::scheduler::Scheduler;

/// Errors that halt startup.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The address space could not be built.
    #[error("address space bootstrap failed: {0}")]
    Bootstrap(#[from] ModelError),

    /// A node the simulators need could not be resolved.
    #[error("failed to resolve {node}: {source}")]
    Resolve {
        /// Identifier that failed.
        node: NodeId,
        /// Why it failed.
        source: ModelError,
    },
}

/// Handles for every demo node, resolved once at startup.
#[derive(Debug, Clone)]
pub struct DemoHandles {
    /// Wrapping counter.
    pub counter: VariableHandle,
    /// Ramp (computed).
    pub ramp: VariableHandle,
    /// Cell the ramp simulator publishes into.
    pub ramp_cell: SharedValue,
    /// Override percentage.
    pub override_percentage: VariableHandle,
    /// Discrete toggle.
    pub toggle: VariableHandle,
    /// Random value.
    pub random: VariableHandle,
    /// Oscillating condition.
    pub condition: ObjectHandle,
    /// Level alarm on the ramp.
    pub level_alarm: ObjectHandle,
    /// Plain event source.
    pub event_notifier: ObjectHandle,
}

impl DemoHandles {
    /// Resolve every demo identifier in `space`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::Resolve`] naming the first identifier that is
    /// missing or of the wrong kind.
    pub fn resolve(space: &AddressSpace, ramp_cell: SharedValue) -> Result<Self, SetupError> {
        Ok(Self {
            counter: variable(space, COUNTER)?,
            ramp: variable(space, RAMP)?,
            ramp_cell,
            override_percentage: variable(space, OVERRIDE_PERCENTAGE)?,
            toggle: variable(space, TOGGLE)?,
            random: variable(space, RANDOM)?,
            condition: object(space, CONDITION, NodeKind::Condition)?,
            level_alarm: object(space, LEVEL_ALARM, NodeKind::Alarm)?,
            event_notifier: object(space, EVENT_NOTIFIER, NodeKind::EventSource)?,
        })
    }
}

fn variable(space: &AddressSpace, id: &str) -> Result<VariableHandle, SetupError> {
    let node = NodeId::new(id);
    space
        .resolve_variable(&node)
        .map_err(|source| SetupError::Resolve { node, source })
}

fn object(space: &AddressSpace, id: &str, kind: NodeKind) -> Result<ObjectHandle, SetupError> {
    let node = NodeId::new(id);
    space
        .resolve_object(&node, kind)
        .map_err(|source| SetupError::Resolve { node, source })
}

/// Build the user table consulted by the permission gate.
pub fn user_table(users: &[UserConfig]) -> UserTable {
    let mut table = UserTable::new();
    for user in users {
        table.insert(&user.name, &user.password, user.roles.iter().copied());
    }
    table
}

/// Build the historian configured by `config`.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the capacity is zero.
pub fn ring_historian(config: &SimulationConfig) -> Result<RingHistorian, ConfigError> {
    let capacity = NonZeroUsize::new(config.historian.capacity).ok_or(ConfigError::Invalid {
        field: "historian.capacity",
        reason: "must be greater than zero".to_owned(),
    })?;
    Ok(RingHistorian::new(capacity))
}

/// Build the demo address space and resolve its handles.
///
/// # Errors
///
/// Returns a [`SetupError`] if bootstrap or resolution fails.
pub fn bootstrap(
    config: &SimulationConfig,
    historian: Arc<dyn Historian>,
    gate: Arc<dyn PermissionGate>,
) -> Result<(AddressSpace, DemoHandles), SetupError> {
    let params = config.demo_parameters()?;
    let DemoSpace { space, ramp } = create_demo_address_space(&params, historian, gate)?;
    let handles = DemoHandles::resolve(&space, ramp)?;
    info!(nodes = space.node_count(), "Demo handles resolved");
    Ok((space, handles))
}

/// Build the full simulator set on a fresh [`Scheduler`].
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] if the configured ranges or thresholds
/// are unusable.
pub fn build_scheduler(
    config: &SimulationConfig,
    handles: &DemoHandles,
    clock: &dyn Clock,
) -> Result<Scheduler, SetupError> {
    let s = &config.scheduler;
    let params = config.demo_parameters()?;
    let thresholds = config.alarm.thresholds().ok_or(ConfigError::Invalid {
        field: "alarm",
        reason: "thresholds must satisfy lowlow <= low <= high <= highhigh".to_owned(),
    })?;
    let now = clock.now();

    let mut scheduler = Scheduler::new();
    scheduler
        .add(Box::new(CounterSimulator::new(
            handles.counter,
            config.counter.clone(),
            Duration::from_millis(s.counter_ms),
        )))
        .add(Box::new(RampSimulator::new(
            handles.ramp,
            handles.ramp_cell.clone(),
            config.ramp.clone(),
            Duration::from_millis(s.ramp_ms),
        )))
        .add(Box::new(OverrideSimulator::new(
            handles.override_percentage,
            NodeId::new(OVERRIDE_PERCENTAGE),
            config.override_percentage.clone(),
            Duration::from_millis(s.override_percentage_ms),
        )))
        .add(Box::new(ToggleSimulator::new(
            handles.toggle,
            Duration::from_millis(s.toggle_ms),
        )))
        .add(Box::new(RandomSimulator::new(
            handles.random,
            params.random_range,
            config.random.seed,
            Duration::from_millis(s.random_ms),
        )))
        .add(Box::new(ConditionSimulator::new(
            handles.condition,
            NodeId::new(CONDITION),
            "Condition".to_owned(),
            config.condition.clone(),
            Duration::from_millis(s.condition_ms),
            now,
        )))
        .add(Box::new(LimitAlarm::new(
            AlarmBinding {
                handle: handles.level_alarm,
                node_id: NodeId::new(LEVEL_ALARM),
                display_name: "Level Alarm".to_owned(),
                input: handles.ramp,
                input_id: NodeId::new(RAMP),
            },
            thresholds,
            config.alarm.raise_policy,
            AlarmSeverities {
                normal: config.alarm.normal_severity,
                limit: config.alarm.limit_severity,
                critical: config.alarm.critical_severity,
            },
            Duration::from_millis(s.alarm_ms),
            now,
        )))
        .add(Box::new(EventEmitter::new(
            handles.event_notifier,
            NodeId::new(EVENT_NOTIFIER),
            "Event Notifier".to_owned(),
            handles.counter,
            Duration::from_millis(s.event_ms),
        )));

    info!(tasks = scheduler.len(), "Simulators assembled");
    Ok(scheduler)
}
