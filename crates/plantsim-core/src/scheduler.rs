//! Periodic scheduler with operator controls.
//!
//! [`Scheduler::spawn`] starts one tokio task per [`SimulationTask`], each
//! on its own [`tokio::time::interval`]. A slow or failing task never delays
//! another task's ticks. Every loop supports:
//!
//! - **Pause/resume**: paused ticks are skipped, timers keep running
//! - **Error isolation**: a failed or panicking tick is logged and skipped
//! - **Shutdown**: cancelling the token stops every loop at its next await
//!
//! Ticks are synchronous, so shutdown never interrupts a tick halfway.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::operator::OperatorState;
use crate::task::{EngineContext, SimulationTask, TickError, TickOutcome};

/// Per-task counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    /// Task name.
    pub name: String,
    /// Tick period in milliseconds.
    pub interval_ms: u64,
    /// Ticks that completed.
    pub ticks: u64,
    /// Ticks skipped because the scheduler was paused.
    pub paused_skips: u64,
    /// Ticks that returned an error or panicked.
    pub failed: u64,
    /// Events raised.
    pub events: u64,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
}

/// Shared, read-mostly view of every task's counters.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStats {
    tasks: Arc<RwLock<Vec<TaskStats>>>,
}

impl SchedulerStats {
    /// Copy of all counters, in registration order.
    pub fn snapshot(&self) -> Vec<TaskStats> {
        self.tasks.read().clone()
    }

    fn update(&self, index: usize, f: impl FnOnce(&mut TaskStats)) {
        if let Some(stats) = self.tasks.write().get_mut(index) {
            f(stats);
        }
    }
}

/// Collection of tasks waiting to be started.
#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<Box<dyn SimulationTask>>,
}

impl core::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let names: Vec<&str> = self.tasks.iter().map(|t| t.name()).collect();
        f.debug_struct("Scheduler").field("tasks", &names).finish()
    }
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task.
    pub fn add(&mut self, task: Box<dyn SimulationTask>) -> &mut Self {
        self.tasks.push(task);
        self
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Start every task on its own tokio task.
    ///
    /// The returned handle's token is a child of the operator's stop token,
    /// so an operator stop shuts the scheduler down as well.
    pub fn spawn(self, ctx: &EngineContext, operator: &Arc<OperatorState>) -> SchedulerHandle {
        let cancel = operator.child_token();
        let stats = SchedulerStats {
            tasks: Arc::new(RwLock::new(
                self.tasks
                    .iter()
                    .map(|t| TaskStats {
                        name: t.name().to_owned(),
                        interval_ms: u64::try_from(t.interval().as_millis()).unwrap_or(u64::MAX),
                        ..TaskStats::default()
                    })
                    .collect(),
            )),
        };

        info!(tasks = self.tasks.len(), "Scheduler starting");
        let handles = self
            .tasks
            .into_iter()
            .enumerate()
            .map(|(index, task)| {
                tokio::spawn(drive(
                    index,
                    task,
                    ctx.clone(),
                    Arc::clone(operator),
                    stats.clone(),
                    cancel.clone(),
                ))
            })
            .collect();

        SchedulerHandle {
            cancel,
            handles,
            stats,
        }
    }
}

/// Running scheduler.
#[derive(Debug)]
pub struct SchedulerHandle {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
    stats: SchedulerStats,
}

impl SchedulerHandle {
    /// Shared counters for every task.
    pub fn stats(&self) -> SchedulerStats {
        self.stats.clone()
    }

    /// Stop every task at its next await point.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Wait until every task loop has exited.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Scheduler task ended abnormally");
            }
        }
        info!("Scheduler stopped");
    }
}

/// Drive one task until cancelled.
async fn drive(
    index: usize,
    mut task: Box<dyn SimulationTask>,
    ctx: EngineContext,
    operator: Arc<OperatorState>,
    stats: SchedulerStats,
    cancel: CancellationToken,
) {
    let period = task.interval().max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; the first real tick is one
    // period after start.
    ticker.tick().await;

    let name = task.name().to_owned();
    debug!(task = %name, period_ms = period.as_millis(), "Task started");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if operator.is_paused() {
                    stats.update(index, |s| s.paused_skips = s.paused_skips.saturating_add(1));
                    continue;
                }
                match run_tick(task.as_mut(), &ctx) {
                    Ok(outcome) => stats.update(index, |s| {
                        s.ticks = s.ticks.saturating_add(1);
                        if matches!(outcome, TickOutcome::Raised(_)) {
                            s.events = s.events.saturating_add(1);
                        }
                    }),
                    Err(e) => {
                        warn!(task = %name, error = %e, "Tick failed, skipping");
                        stats.update(index, |s| {
                            s.failed = s.failed.saturating_add(1);
                            s.last_error = Some(e.to_string());
                        });
                    }
                }
            }
        }
    }

    debug!(task = %name, "Task stopped");
}

/// Run one tick, converting a panic into a [`TickError`].
fn run_tick(task: &mut dyn SimulationTask, ctx: &EngineContext) -> Result<TickOutcome, TickError> {
    match catch_unwind(AssertUnwindSafe(|| task.tick(ctx))) {
        Ok(result) => result,
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_owned()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_owned()
            };
            Err(TickError::Panicked { message })
        }
    }
}
