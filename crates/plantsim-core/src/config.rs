//! Configuration loading and typed config structures for plantsim.
//!
//! The canonical configuration lives in `plantsim-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//! Every field has a default, so an empty file is a valid configuration.

use std::path::Path;

use plantsim_model::DemoParameters;
use plantsim_types::{Role, ValueRange};
use serde::{Deserialize, Serialize};

use crate::alarm::{LimitThresholds, RaisePolicy};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but is not internally consistent.
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `plantsim-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Observer server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-task tick intervals.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Wrapping counter parameters.
    #[serde(default)]
    pub counter: CounterConfig,

    /// Bidirectional ramp parameters.
    #[serde(default)]
    pub ramp: RampConfig,

    /// Override percentage generator parameters.
    #[serde(default)]
    pub override_percentage: OverrideConfig,

    /// Random value simulator parameters.
    #[serde(default)]
    pub random: RandomConfig,

    /// Oscillating condition parameters.
    #[serde(default)]
    pub condition: ConditionConfig,

    /// Limit alarm thresholds and raise policy.
    #[serde(default)]
    pub alarm: AlarmConfig,

    /// Historian retention.
    #[serde(default)]
    pub historian: HistorianConfig,

    /// Users known to the permission gate.
    #[serde(default = "default_users")]
    pub users: Vec<UserConfig>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the observer address:
    /// - `PLANTSIM_OBSERVER_HOST` overrides `server.host`
    /// - `PLANTSIM_OBSERVER_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.server.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scheduler.validate()?;

        if self.counter.step == 0 {
            return invalid("counter.step", "must be greater than zero");
        }
        if self.counter.floor > self.counter.ceiling {
            return invalid("counter.floor", "must not exceed counter.ceiling");
        }

        if !(self.ramp.step.is_finite() && self.ramp.step > 0.0) {
            return invalid("ramp.step", "must be a positive number");
        }
        if !self.ramp.floor.is_finite()
            || !self.ramp.ceiling.is_finite()
            || self.ramp.floor >= self.ramp.ceiling
        {
            return invalid("ramp.floor", "must be below ramp.ceiling");
        }

        let o = &self.override_percentage;
        if !(o.step.is_finite() && o.step > 0.0) {
            return invalid("override_percentage.step", "must be a positive number");
        }
        if o.floor.is_nan() || o.ceiling.is_nan() || o.floor > o.ceiling {
            return invalid(
                "override_percentage.floor",
                "must not exceed override_percentage.ceiling",
            );
        }
        if o.floor < PERCENT_MIN || o.ceiling > PERCENT_MAX {
            return invalid("override_percentage", "floor and ceiling must lie in [0, 100]");
        }

        if ValueRange::new(self.random.min, self.random.max).is_none() {
            return invalid("random.min", "must be finite and not exceed random.max");
        }
        if !(self.random.max - self.random.min).is_finite() {
            return invalid("random", "max - min must be a finite number");
        }

        let c = &self.condition;
        for (field, severity) in [
            ("condition.good_severity", c.good_severity),
            ("condition.bad_severity", c.bad_severity),
            ("alarm.normal_severity", self.alarm.normal_severity),
            ("alarm.limit_severity", self.alarm.limit_severity),
            ("alarm.critical_severity", self.alarm.critical_severity),
        ] {
            if !SEVERITY_RANGE.contains(&severity) {
                return invalid(field, "must lie in [1, 1000]");
            }
        }
        if c.bad_severity <= c.good_severity {
            return invalid("condition.bad_severity", "must exceed condition.good_severity");
        }

        if self.alarm.thresholds().is_none() {
            return invalid(
                "alarm",
                "thresholds must satisfy lowlow <= low <= high <= highhigh",
            );
        }

        for (field, size) in [
            ("historian.capacity", self.historian.capacity),
            ("server.event_log_size", self.server.event_log_size),
            ("server.broadcast_capacity", self.server.broadcast_capacity),
        ] {
            if size == 0 {
                return invalid(field, "must be greater than zero");
            }
            if size > MAX_BUFFER_CAPACITY {
                return invalid(field, "must not exceed 1000000");
            }
        }
        Ok(())
    }

    /// Initial values and ranges for the demo address space.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a range is inverted.
    pub fn demo_parameters(&self) -> Result<DemoParameters, ConfigError> {
        let override_range =
            ValueRange::new(PERCENT_MIN, PERCENT_MAX).ok_or(ConfigError::Invalid {
                field: "override_percentage",
                reason: "percentage range is empty".to_owned(),
            })?;
        let random_range =
            ValueRange::new(self.random.min, self.random.max).ok_or(ConfigError::Invalid {
                field: "random.min",
                reason: "must not exceed random.max".to_owned(),
            })?;
        Ok(DemoParameters {
            counter_initial: self.counter.floor,
            ramp_initial: self.ramp.floor,
            override_initial: self.override_percentage.floor,
            override_range,
            random_range,
        })
    }
}

/// Lower bound of the override percentage variable.
pub const PERCENT_MIN: f64 = 0.0;
/// Upper bound of the override percentage variable.
pub const PERCENT_MAX: f64 = 100.0;

/// Accepted severity values.
pub const SEVERITY_RANGE: core::ops::RangeInclusive<u16> = 1..=1000;

/// Upper bound on every in-memory buffer size (historian, event log,
/// live-event channel).
pub const MAX_BUFFER_CAPACITY: usize = 1_000_000;

fn invalid(field: &'static str, reason: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    })
}

/// Observer server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of recent events kept for `GET /api/events`.
    #[serde(default = "default_event_log_size")]
    pub event_log_size: usize,

    /// Capacity of the live event broadcast channel.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

impl ServerConfig {
    /// Override the bind address with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PLANTSIM_OBSERVER_HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("PLANTSIM_OBSERVER_PORT")
            && let Ok(port) = val.parse::<u16>()
        {
            self.port = port;
        }
    }

    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            event_log_size: default_event_log_size(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

/// Tick interval per simulation task, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchedulerConfig {
    /// Wrapping counter.
    #[serde(default = "default_continuous_ms")]
    pub counter_ms: u64,

    /// Bidirectional ramp.
    #[serde(default = "default_continuous_ms")]
    pub ramp_ms: u64,

    /// Override percentage generator.
    #[serde(default = "default_continuous_ms")]
    pub override_percentage_ms: u64,

    /// Random value simulator.
    #[serde(default = "default_continuous_ms")]
    pub random_ms: u64,

    /// Discrete toggle.
    #[serde(default = "default_toggle_ms")]
    pub toggle_ms: u64,

    /// Condition oscillation.
    #[serde(default = "default_condition_ms")]
    pub condition_ms: u64,

    /// Limit alarm evaluation.
    #[serde(default = "default_alarm_ms")]
    pub alarm_ms: u64,

    /// Plain event emission.
    #[serde(default = "default_event_ms")]
    pub event_ms: u64,
}

impl SchedulerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("scheduler.counter_ms", self.counter_ms),
            ("scheduler.ramp_ms", self.ramp_ms),
            ("scheduler.override_percentage_ms", self.override_percentage_ms),
            ("scheduler.random_ms", self.random_ms),
            ("scheduler.toggle_ms", self.toggle_ms),
            ("scheduler.condition_ms", self.condition_ms),
            ("scheduler.alarm_ms", self.alarm_ms),
            ("scheduler.event_ms", self.event_ms),
        ];
        for (field, ms) in intervals {
            if ms == 0 {
                return invalid(field, "interval must be greater than zero");
            }
        }
        Ok(())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            counter_ms: default_continuous_ms(),
            ramp_ms: default_continuous_ms(),
            override_percentage_ms: default_continuous_ms(),
            random_ms: default_continuous_ms(),
            toggle_ms: default_toggle_ms(),
            condition_ms: default_condition_ms(),
            alarm_ms: default_alarm_ms(),
            event_ms: default_event_ms(),
        }
    }
}

/// Wrapping counter parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CounterConfig {
    /// Initial and reset value.
    #[serde(default = "default_counter_floor")]
    pub floor: u32,

    /// Increment per tick.
    #[serde(default = "default_counter_step")]
    pub step: u32,

    /// Highest value kept before wrapping to `floor`.
    #[serde(default = "default_counter_ceiling")]
    pub ceiling: u32,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            floor: default_counter_floor(),
            step: default_counter_step(),
            ceiling: default_counter_ceiling(),
        }
    }
}

/// Bidirectional ramp parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RampConfig {
    /// Initial and reset value; may be negative.
    #[serde(default = "default_ramp_floor")]
    pub floor: f64,

    /// Increment per tick.
    #[serde(default = "default_ramp_step")]
    pub step: f64,

    /// Reaching this value resets the ramp to `floor`.
    #[serde(default = "default_ramp_ceiling")]
    pub ceiling: f64,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            floor: default_ramp_floor(),
            step: default_ramp_step(),
            ceiling: default_ramp_ceiling(),
        }
    }
}

/// Override percentage generator parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverrideConfig {
    /// Initial and reset value.
    #[serde(default = "default_override_floor")]
    pub floor: f64,

    /// Increment per tick.
    #[serde(default = "default_override_step")]
    pub step: f64,

    /// Highest value kept before wrapping to `floor`.
    #[serde(default = "default_override_ceiling")]
    pub ceiling: f64,
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            floor: default_override_floor(),
            step: default_override_step(),
            ceiling: default_override_ceiling(),
        }
    }
}

/// Random value simulator parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RandomConfig {
    /// RNG seed; equal seeds give equal sequences.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Inclusive lower bound.
    #[serde(default = "default_random_min")]
    pub min: f64,

    /// Inclusive upper bound.
    #[serde(default = "default_random_max")]
    pub max: f64,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            min: default_random_min(),
            max: default_random_max(),
        }
    }
}

/// Oscillating condition parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConditionConfig {
    /// Message while Good.
    #[serde(default = "default_good_message")]
    pub good_message: String,

    /// Severity while Good.
    #[serde(default = "default_good_severity")]
    pub good_severity: u16,

    /// Message while Bad.
    #[serde(default = "default_bad_message")]
    pub bad_message: String,

    /// Severity while Bad.
    #[serde(default = "default_bad_severity")]
    pub bad_severity: u16,
}

impl Default for ConditionConfig {
    fn default() -> Self {
        Self {
            good_message: default_good_message(),
            good_severity: default_good_severity(),
            bad_message: default_bad_message(),
            bad_severity: default_bad_severity(),
        }
    }
}

/// Limit alarm thresholds, severities, and raise policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AlarmConfig {
    /// Below this the alarm is in `LowLow`.
    #[serde(default = "default_lowlow")]
    pub lowlow: f64,

    /// Below this (and at or above `lowlow`) the alarm is in `Low`.
    #[serde(default = "default_low")]
    pub low: f64,

    /// Above this (and at or below `highhigh`) the alarm is in `High`.
    #[serde(default = "default_high")]
    pub high: f64,

    /// Above this the alarm is in `HighHigh`.
    #[serde(default = "default_highhigh")]
    pub highhigh: f64,

    /// When to raise events.
    #[serde(default)]
    pub raise_policy: RaisePolicy,

    /// Severity of `Low`/`High` events.
    #[serde(default = "default_limit_severity")]
    pub limit_severity: u16,

    /// Severity of `LowLow`/`HighHigh` events.
    #[serde(default = "default_critical_severity")]
    pub critical_severity: u16,

    /// Severity of the return-to-normal event.
    #[serde(default = "default_normal_severity")]
    pub normal_severity: u16,
}

impl AlarmConfig {
    /// Thresholds as a validated set, or `None` if they are unordered.
    pub fn thresholds(&self) -> Option<LimitThresholds> {
        LimitThresholds::new(self.lowlow, self.low, self.high, self.highhigh)
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            lowlow: default_lowlow(),
            low: default_low(),
            high: default_high(),
            highhigh: default_highhigh(),
            raise_policy: RaisePolicy::default(),
            limit_severity: default_limit_severity(),
            critical_severity: default_critical_severity(),
            normal_severity: default_normal_severity(),
        }
    }
}

/// Historian retention.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistorianConfig {
    /// Samples kept per historized variable.
    #[serde(default = "default_historian_capacity")]
    pub capacity: usize,
}

impl Default for HistorianConfig {
    fn default() -> Self {
        Self {
            capacity: default_historian_capacity(),
        }
    }
}

/// One configured user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Login name.
    pub name: String,
    /// Plain-text password.
    pub password: String,
    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<Role>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    8080
}

const fn default_event_log_size() -> usize {
    500
}

const fn default_broadcast_capacity() -> usize {
    1024
}

const fn default_continuous_ms() -> u64 {
    1_000
}

const fn default_toggle_ms() -> u64 {
    10_000
}

const fn default_condition_ms() -> u64 {
    15_000
}

const fn default_alarm_ms() -> u64 {
    1_000
}

const fn default_event_ms() -> u64 {
    60_000
}

const fn default_counter_floor() -> u32 {
    100
}

const fn default_counter_step() -> u32 {
    100
}

const fn default_counter_ceiling() -> u32 {
    1000
}

const fn default_ramp_floor() -> f64 {
    -20.0
}

const fn default_ramp_step() -> f64 {
    2.5
}

const fn default_ramp_ceiling() -> f64 {
    70.0
}

const fn default_override_floor() -> f64 {
    0.0
}

const fn default_override_step() -> f64 {
    5.0
}

const fn default_override_ceiling() -> f64 {
    100.0
}

const fn default_seed() -> u64 {
    42
}

const fn default_random_min() -> f64 {
    0.0
}

const fn default_random_max() -> f64 {
    100.0
}

fn default_good_message() -> String {
    "Good!".to_owned()
}

const fn default_good_severity() -> u16 {
    150
}

fn default_bad_message() -> String {
    "Bad!".to_owned()
}

const fn default_bad_severity() -> u16 {
    800
}

const fn default_lowlow() -> f64 {
    -5.0
}

const fn default_low() -> f64 {
    20.0
}

const fn default_high() -> f64 {
    40.0
}

const fn default_highhigh() -> f64 {
    50.0
}

const fn default_limit_severity() -> u16 {
    500
}

const fn default_critical_severity() -> u16 {
    900
}

const fn default_normal_severity() -> u16 {
    100
}

const fn default_historian_capacity() -> usize {
    1000
}

fn default_users() -> Vec<UserConfig> {
    vec![
        UserConfig {
            name: "operator".to_owned(),
            password: "operator".to_owned(),
            roles: vec![Role::Operator],
        },
        UserConfig {
            name: "engineer".to_owned(),
            password: "engineer".to_owned(),
            roles: vec![Role::Engineer],
        },
        UserConfig {
            name: "admin".to_owned(),
            password: "admin".to_owned(),
            roles: vec![Role::Admin],
        },
    ]
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scheduler.toggle_ms, 10_000);
        assert_eq!(config.scheduler.condition_ms, 15_000);
        assert_eq!(config.scheduler.event_ms, 60_000);
        assert_eq!(config.condition.good_severity, 150);
        assert_eq!(config.condition.bad_severity, 800);
        assert_eq!(config.alarm.raise_policy, RaisePolicy::OnTransition);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "0.0.0.0"
  port: 9090
  event_log_size: 50

scheduler:
  counter_ms: 500
  condition_ms: 2000

counter:
  floor: 1
  step: 1
  ceiling: 10

ramp:
  floor: -10.0
  step: 1.0
  ceiling: 60.0

random:
  seed: 7
  min: -1.0
  max: 1.0

condition:
  good_message: "OK"
  bad_message: "FAULT"

alarm:
  lowlow: 0.0
  low: 10.0
  high: 20.0
  highhigh: 30.0
  raise_policy: every_tick

historian:
  capacity: 16

users:
  - name: alice
    password: secret
    roles: [operator, engineer]

logging:
  level: "debug"
  json: true
"#;

        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.scheduler.counter_ms, 500);
        assert_eq!(config.scheduler.ramp_ms, 1_000);
        assert_eq!(config.counter.ceiling, 10);
        assert_eq!(config.random.seed, 7);
        assert_eq!(config.condition.good_message, "OK");
        assert_eq!(config.condition.good_severity, 150);
        assert_eq!(config.alarm.raise_policy, RaisePolicy::EveryTick);
        assert_eq!(config.historian.capacity, 16);
        assert_eq!(config.users.len(), 1);
        assert_eq!(
            config.users.first().map(|u| u.roles.clone()),
            Some(vec![Role::Operator, Role::Engineer])
        );
        assert!(config.logging.json);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = SimulationConfig::parse("counter:\n  step: 50\n").unwrap();
        assert_eq!(config.counter.step, 50);
        assert_eq!(config.counter.floor, 100);
        assert_eq!(config.users.len(), 3);
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(SimulationConfig::parse("").is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result = SimulationConfig::parse("scheduler:\n  alarm_ms: 0\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "scheduler.alarm_ms",
                ..
            })
        ));
    }

    #[test]
    fn unordered_thresholds_are_rejected() {
        let result = SimulationConfig::parse("alarm:\n  low: 45.0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { field: "alarm", .. })));
    }

    #[test]
    fn inverted_sawtooth_is_rejected() {
        let result = SimulationConfig::parse("counter:\n  floor: 2000\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "counter.floor",
                ..
            })
        ));
        let result = SimulationConfig::parse("ramp:\n  floor: 80.0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { field: "ramp.floor", .. })));
    }

    #[test]
    fn inverted_random_range_is_rejected() {
        let result = SimulationConfig::parse("random:\n  min: 5.0\n  max: 1.0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { field: "random.min", .. })));
    }

    #[test]
    fn zero_historian_capacity_is_rejected() {
        let result = SimulationConfig::parse("historian:\n  capacity: 0\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "historian.capacity",
                ..
            })
        ));
    }

    #[test]
    fn zero_broadcast_capacity_is_rejected() {
        let result = SimulationConfig::parse("server:\n  broadcast_capacity: 0\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "server.broadcast_capacity",
                ..
            })
        ));
    }

    #[test]
    fn non_increasing_condition_severity_is_rejected() {
        let result =
            SimulationConfig::parse("condition:\n  good_severity: 900\n  bad_severity: 100\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "condition.bad_severity",
                ..
            })
        ));
        let result =
            SimulationConfig::parse("condition:\n  good_severity: 500\n  bad_severity: 500\n");
        assert!(result.is_err());
    }

    #[test]
    fn out_of_range_severity_is_rejected() {
        let result = SimulationConfig::parse("alarm:\n  critical_severity: 1500\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "alarm.critical_severity",
                ..
            })
        ));
        let result = SimulationConfig::parse("condition:\n  good_severity: 0\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "condition.good_severity",
                ..
            })
        ));
    }

    #[test]
    fn unbounded_random_range_is_rejected() {
        let result = SimulationConfig::parse("random:\n  min: -.inf\n  max: .inf\n");
        assert!(matches!(result, Err(ConfigError::Invalid { field: "random.min", .. })));
        let result = SimulationConfig::parse("random:\n  min: -1.0e308\n  max: 1.0e308\n");
        assert!(matches!(result, Err(ConfigError::Invalid { field: "random", .. })));
    }

    #[test]
    fn oversized_buffers_are_rejected() {
        let result = SimulationConfig::parse("historian:\n  capacity: 18446744073709551615\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "historian.capacity",
                ..
            })
        ));
        let result = SimulationConfig::parse("server:\n  broadcast_capacity: 9223372036854775808\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "server.broadcast_capacity",
                ..
            })
        ));
    }

    #[test]
    fn demo_parameters_follow_floors() {
        let params = SimulationConfig::default().demo_parameters().unwrap();
        assert_eq!(params.counter_initial, 100);
        assert!((params.ramp_initial - -20.0).abs() < f64::EPSILON);
        assert!((params.override_range.max - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("plantsim-config.yaml");
        if path.exists() {
            let config = SimulationConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
