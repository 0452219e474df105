//! Simulation and alarm/condition engine for plantsim.
//!
//! This crate owns the periodic state machines that mutate variable values,
//! toggle condition state, evaluate alarm thresholds, and raise events.
//!
//! # Modules
//!
//! - [`alarm`] -- Threshold classification and the [`LimitAlarm`] evaluator.
//! - [`clock`] -- [`Clock`] trait with system and manual implementations.
//! - [`condition`] -- The oscillating Good/Bad [`ConditionSimulator`].
//! - [`config`] -- Configuration loading from `plantsim-config.yaml` into
//!   strongly-typed structs.
//! - [`discrete`] -- Boolean toggle and seeded random value simulators.
//! - [`emitter`] -- Periodic plain-event [`EventEmitter`].
//! - [`operator`] -- Pause/resume/stop control shared with the API.
//! - [`plant`] -- Startup assembly and one-time handle resolution.
//! - [`sawtooth`] -- Wrapping counter, ramp, and override percentage.
//! - [`scheduler`] -- One tokio task per simulator on its own interval.
//! - [`task`] -- The [`SimulationTask`] trait and [`TickError`].
//!
//! [`LimitAlarm`]: alarm::LimitAlarm
//! [`Clock`]: clock::Clock
//! [`ConditionSimulator`]: condition::ConditionSimulator
//! [`EventEmitter`]: emitter::EventEmitter
//! [`SimulationTask`]: task::SimulationTask
//! [`TickError`]: task::TickError

pub mod alarm;
pub mod clock;
pub mod condition;
pub mod config;
pub mod discrete;
pub mod emitter;
pub mod operator;
pub mod plant;
pub mod sawtooth;
pub mod scheduler;
pub mod task;

#[cfg(test)]
mod testing;
