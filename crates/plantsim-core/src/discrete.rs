//! Discrete toggle and seeded random value simulators.

use std::time::Duration;

use plantsim_model::VariableHandle;
use plantsim_types::{Value, ValueRange};
use rand::distr::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::task::{EngineContext, SimulationTask, TickError, TickOutcome};

/// Boolean variable flipped on every tick.
#[derive(Debug)]
pub struct ToggleSimulator {
    handle: VariableHandle,
    interval: Duration,
    state: bool,
}

impl ToggleSimulator {
    /// Create a toggle starting at `false`.
    pub const fn new(handle: VariableHandle, interval: Duration) -> Self {
        Self {
            handle,
            interval,
            state: false,
        }
    }

    /// Current state.
    pub const fn state(&self) -> bool {
        self.state
    }
}

impl SimulationTask for ToggleSimulator {
    fn name(&self) -> &'static str {
        "toggle"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn tick(&mut self, ctx: &EngineContext) -> Result<TickOutcome, TickError> {
        let next = !self.state;
        ctx.space.write(self.handle, Value::Boolean(next), ctx.clock.now())?;
        self.state = next;
        debug!(state = next, "Toggle flipped");
        Ok(TickOutcome::Updated)
    }
}

/// `Double` variable set to a uniform sample from its range on every tick.
///
/// The RNG is seeded, so a given seed reproduces the same sequence.
#[derive(Debug)]
pub struct RandomSimulator {
    handle: VariableHandle,
    range: ValueRange,
    interval: Duration,
    rng: StdRng,
}

impl RandomSimulator {
    /// Create a generator sampling `range` with the given seed.
    pub fn new(handle: VariableHandle, range: ValueRange, seed: u64, interval: Duration) -> Self {
        Self {
            handle,
            range,
            interval,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl SimulationTask for RandomSimulator {
    fn name(&self) -> &'static str {
        "random"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn tick(&mut self, ctx: &EngineContext) -> Result<TickOutcome, TickError> {
        let variable = ctx.space.variable(self.handle)?;
        let distribution = Uniform::new_inclusive(self.range.min, self.range.max).map_err(|e| {
            TickError::InvalidRange {
                node: variable.definition().node_id.clone(),
                reason: e.to_string(),
            }
        })?;
        let sample = self.rng.sample(distribution);
        ctx.space.write(self.handle, Value::Double(sample), ctx.clock.now())?;
        debug!(value = sample, "Random value sampled");
        Ok(TickOutcome::Updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::demo_context;

    #[test]
    fn toggle_alternates() {
        let (ctx, demo) = demo_context();
        let mut sim = ToggleSimulator::new(demo.toggle, Duration::from_secs(10));
        sim.tick(&ctx).unwrap();
        assert_eq!(ctx.space.read(demo.toggle).unwrap(), Value::Boolean(true));
        sim.tick(&ctx).unwrap();
        assert_eq!(ctx.space.read(demo.toggle).unwrap(), Value::Boolean(false));
        assert!(!sim.state());
    }

    #[test]
    fn random_stays_in_range_and_is_reproducible() {
        let (ctx, demo) = demo_context();
        let range = ValueRange::new(0.0, 10.0).unwrap();
        let mut a = RandomSimulator::new(demo.random, range, 7, Duration::from_secs(1));
        let mut b = RandomSimulator::new(demo.random, range, 7, Duration::from_secs(1));

        for _ in 0..50 {
            a.tick(&ctx).unwrap();
            let first = ctx.space.read(demo.random).unwrap();
            b.tick(&ctx).unwrap();
            let second = ctx.space.read(demo.random).unwrap();
            assert_eq!(first, second);
            let v = first.as_f64().unwrap();
            assert!(range.contains(v));
        }
    }

    #[test]
    fn unsampleable_range_fails_the_tick_without_writing() {
        let (ctx, demo) = demo_context();
        let before = ctx.space.read(demo.random).unwrap();
        for range in [
            ValueRange {
                min: f64::NEG_INFINITY,
                max: f64::INFINITY,
            },
            ValueRange {
                min: -1.0e308,
                max: 1.0e308,
            },
        ] {
            let mut sim = RandomSimulator::new(demo.random, range, 7, Duration::from_secs(1));
            let err = sim.tick(&ctx).unwrap_err();
            assert!(matches!(err, TickError::InvalidRange { .. }));
        }
        assert_eq!(ctx.space.read(demo.random).unwrap(), before);
    }
}
