//! Four-threshold limit alarm.
//!
//! [`classify`] maps an input value to a [`LimitBand`]. [`LimitAlarm`]
//! polls its input variable on a fixed interval, classifies the value, and
//! raises events according to its [`RaisePolicy`]. Retain is `true` for the
//! alarm's whole lifetime.

use std::time::Duration;

use chrono::{DateTime, Utc};
use plantsim_model::{ObjectHandle, VariableHandle};
use plantsim_types::{AlarmSnapshot, Event, EventDetail, EventId, LimitBand, NodeId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::task::{EngineContext, SimulationTask, TickError, TickOutcome};

/// Ordered thresholds `lowlow <= low <= high <= highhigh`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitThresholds {
    lowlow: f64,
    low: f64,
    high: f64,
    highhigh: f64,
}

impl LimitThresholds {
    /// Build a threshold set. Returns `None` if any value is not finite or
    /// the values are not ordered.
    pub fn new(lowlow: f64, low: f64, high: f64, highhigh: f64) -> Option<Self> {
        let all = [lowlow, low, high, highhigh];
        if !all.iter().all(|v| v.is_finite()) {
            return None;
        }
        if lowlow <= low && low <= high && high <= highhigh {
            Some(Self {
                lowlow,
                low,
                high,
                highhigh,
            })
        } else {
            None
        }
    }
}

/// Classify `value` against `thresholds`.
///
/// | Input | Band |
/// |---|---|
/// | `< lowlow` | `LowLow` |
/// | `[lowlow, low)` | `Low` |
/// | `[low, high]` | `Normal` |
/// | `(high, highhigh]` | `High` |
/// | `> highhigh` | `HighHigh` |
pub fn classify(value: f64, thresholds: &LimitThresholds) -> LimitBand {
    if value < thresholds.lowlow {
        LimitBand::LowLow
    } else if value < thresholds.low {
        LimitBand::Low
    } else if value <= thresholds.high {
        LimitBand::Normal
    } else if value <= thresholds.highhigh {
        LimitBand::High
    } else {
        LimitBand::HighHigh
    }
}

/// When a limit alarm raises events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaisePolicy {
    /// Only when the band changes.
    #[default]
    OnTransition,
    /// On every evaluation; events for an unchanged band carry
    /// `new_state = false`.
    EveryTick,
}

/// Event severity per band group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmSeverities {
    /// `Normal` (return to normal).
    pub normal: u16,
    /// `Low` and `High`.
    pub limit: u16,
    /// `LowLow` and `HighHigh`.
    pub critical: u16,
}

impl AlarmSeverities {
    const fn for_band(self, band: LimitBand) -> u16 {
        match band {
            LimitBand::Normal => self.normal,
            LimitBand::Low | LimitBand::High => self.limit,
            LimitBand::LowLow | LimitBand::HighHigh => self.critical,
        }
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Band the input fell into.
    pub band: LimitBand,
    /// Whether the band differs from the previous evaluation.
    pub changed: bool,
    /// Event to raise, if the policy asks for one.
    pub event: Option<Event>,
}

/// Limit alarm on one input variable.
#[derive(Debug)]
pub struct LimitAlarm {
    handle: ObjectHandle,
    node_id: NodeId,
    display_name: String,
    input: VariableHandle,
    input_id: NodeId,
    thresholds: LimitThresholds,
    policy: RaisePolicy,
    severities: AlarmSeverities,
    interval: Duration,
    band: Option<LimitBand>,
    time: DateTime<Utc>,
}

/// Identity and wiring of a [`LimitAlarm`].
#[derive(Debug, Clone)]
pub struct AlarmBinding {
    /// Handle of the alarm node.
    pub handle: ObjectHandle,
    /// Identifier of the alarm node.
    pub node_id: NodeId,
    /// Display name used as the event source name.
    pub display_name: String,
    /// Handle of the input variable.
    pub input: VariableHandle,
    /// Identifier of the input variable.
    pub input_id: NodeId,
}

impl LimitAlarm {
    /// Create an alarm that has not yet been evaluated.
    pub fn new(
        binding: AlarmBinding,
        thresholds: LimitThresholds,
        policy: RaisePolicy,
        severities: AlarmSeverities,
        interval: Duration,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            handle: binding.handle,
            node_id: binding.node_id,
            display_name: binding.display_name,
            input: binding.input,
            input_id: binding.input_id,
            thresholds,
            policy,
            severities,
            interval,
            band: None,
            time: created,
        }
    }

    /// Band of the latest evaluation, if any.
    pub const fn band(&self) -> Option<LimitBand> {
        self.band
    }

    /// Observable state.
    pub fn snapshot(&self) -> AlarmSnapshot {
        let band = self.band.unwrap_or(LimitBand::Normal);
        AlarmSnapshot {
            node_id: self.node_id.clone(),
            input: self.input_id.clone(),
            band,
            active: band.is_active(),
            retain: true,
            severity: self.severities.for_band(band),
            time: self.time,
        }
    }

    /// Classify `value` and update the alarm's state.
    ///
    /// The alarm starts out inactive, so a first evaluation in the `Normal`
    /// band is not a transition.
    pub fn evaluate(&mut self, value: f64, now: DateTime<Utc>) -> Evaluation {
        let band = classify(value, &self.thresholds);
        let previous = self.band;
        let changed = band != previous.unwrap_or(LimitBand::Normal);

        self.band = Some(band);
        if changed {
            self.time = now;
        }

        let raise = changed || self.policy == RaisePolicy::EveryTick;
        let event = raise.then(|| self.event(band, previous, value, changed));
        Evaluation {
            band,
            changed,
            event,
        }
    }

    fn event(
        &self,
        band: LimitBand,
        previous: Option<LimitBand>,
        input: f64,
        new_state: bool,
    ) -> Event {
        let message = if band.is_active() {
            format!("{} in {band:?} (input {input})", self.display_name)
        } else {
            format!("{} back to normal (input {input})", self.display_name)
        };
        Event {
            id: EventId::new(),
            source: self.node_id.clone(),
            source_name: self.display_name.clone(),
            severity: self.severities.for_band(band),
            message,
            retain: true,
            new_state,
            time: self.time,
            detail: EventDetail::LimitAlarm {
                band,
                previous,
                input,
                input_node: self.input_id.clone(),
            },
        }
    }
}

impl SimulationTask for LimitAlarm {
    fn name(&self) -> &'static str {
        "limit_alarm"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn tick(&mut self, ctx: &EngineContext) -> Result<TickOutcome, TickError> {
        ctx.space.object(self.handle)?;
        let raw = ctx.space.read(self.input)?;
        let value = raw.as_f64().ok_or_else(|| TickError::UnexpectedType {
            node: self.input_id.clone(),
            expected: plantsim_types::DataType::Double,
            actual: raw.data_type(),
        })?;
        if !value.is_finite() {
            return Err(TickError::NonFinite {
                node: self.input_id.clone(),
            });
        }

        let evaluation = self.evaluate(value, ctx.clock.now());
        debug!(
            band = ?evaluation.band,
            changed = evaluation.changed,
            input = value,
            "Limit alarm evaluated"
        );
        Ok(evaluation
            .event
            .map_or(TickOutcome::Quiet, |event| {
                TickOutcome::Raised(ctx.notifier.notify(&event))
            }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use plantsim_events::ChannelSubscriber;
    use tokio::sync::mpsc;

    use super::*;
    use crate::testing::demo_context;

    fn thresholds() -> LimitThresholds {
        LimitThresholds::new(-5.0, 20.0, 40.0, 50.0).unwrap()
    }

    fn severities() -> AlarmSeverities {
        AlarmSeverities {
            normal: 100,
            limit: 500,
            critical: 900,
        }
    }

    fn alarm(policy: RaisePolicy) -> (LimitAlarm, crate::task::EngineContext) {
        let (ctx, demo) = demo_context();
        let binding = AlarmBinding {
            handle: demo.level_alarm,
            node_id: NodeId::new(plantsim_model::bootstrap::LEVEL_ALARM),
            display_name: "Level Alarm".to_owned(),
            input: demo.ramp,
            input_id: NodeId::new(plantsim_model::bootstrap::RAMP),
        };
        let alarm = LimitAlarm::new(
            binding,
            thresholds(),
            policy,
            severities(),
            Duration::from_secs(1),
            Utc::now(),
        );
        (alarm, ctx)
    }

    #[test]
    fn classifies_reference_inputs() {
        let t = thresholds();
        let got: Vec<LimitBand> = [-10.0, 0.0, 30.0, 45.0, 60.0]
            .into_iter()
            .map(|v| classify(v, &t))
            .collect();
        assert_eq!(
            got,
            vec![
                LimitBand::LowLow,
                LimitBand::Low,
                LimitBand::Normal,
                LimitBand::High,
                LimitBand::HighHigh
            ]
        );
    }

    #[test]
    fn boundaries_are_inclusive_where_documented() {
        let t = thresholds();
        assert_eq!(classify(-5.0, &t), LimitBand::Low);
        assert_eq!(classify(20.0, &t), LimitBand::Normal);
        assert_eq!(classify(40.0, &t), LimitBand::Normal);
        assert_eq!(classify(50.0, &t), LimitBand::High);
    }

    #[test]
    fn unordered_thresholds_are_rejected() {
        assert!(LimitThresholds::new(0.0, 10.0, 5.0, 20.0).is_none());
        assert!(LimitThresholds::new(f64::NAN, 1.0, 2.0, 3.0).is_none());
        assert!(LimitThresholds::new(1.0, 1.0, 1.0, 1.0).is_some());
    }

    #[test]
    fn on_transition_raises_once_per_band_change() {
        let (mut alarm, _ctx) = alarm(RaisePolicy::OnTransition);
        let now = Utc::now();
        let inputs = [30.0, 30.0, 45.0, 46.0, 47.0, 60.0, 60.0, 30.0];
        let raised: Vec<bool> = inputs
            .iter()
            .map(|v| alarm.evaluate(*v, now).event.is_some())
            .collect();
        assert_eq!(
            raised,
            vec![false, false, true, false, false, true, false, true]
        );
    }

    #[test]
    fn every_tick_marks_repeats_as_not_new() {
        let (mut alarm, _ctx) = alarm(RaisePolicy::EveryTick);
        let now = Utc::now();
        let first = alarm.evaluate(45.0, now).event.unwrap();
        assert!(first.new_state);
        let second = alarm.evaluate(46.0, now).event.unwrap();
        assert!(!second.new_state);
        assert!(second.retain);
        assert_eq!(second.severity, 500);
    }

    #[test]
    fn snapshot_tracks_activity() {
        let (mut alarm, _ctx) = alarm(RaisePolicy::OnTransition);
        assert!(!alarm.snapshot().active);
        alarm.evaluate(-10.0, Utc::now());
        let snap = alarm.snapshot();
        assert!(snap.active);
        assert!(snap.retain);
        assert_eq!(snap.band, LimitBand::LowLow);
        assert_eq!(snap.severity, 900);
    }

    #[test]
    fn tick_reads_ramp_and_notifies() {
        let (mut alarm, ctx) = alarm(RaisePolicy::OnTransition);
        let (tx, mut rx) = mpsc::channel(8);
        ctx.notifier.subscribe(Arc::new(ChannelSubscriber::new(tx)));

        // Demo ramp starts at -20, which is below lowlow.
        let outcome = alarm.tick(&ctx).unwrap();
        assert!(matches!(outcome, TickOutcome::Raised(_)));
        let event = rx.try_recv().unwrap();
        assert!(matches!(
            event.detail,
            EventDetail::LimitAlarm {
                band: LimitBand::LowLow,
                previous: None,
                ..
            }
        ));

        assert_eq!(alarm.tick(&ctx).unwrap(), TickOutcome::Quiet);
        assert!(rx.try_recv().is_err());
    }
}
