//! Engine binary for plantsim.
//!
//! Wires together the demo address space, the simulators, the event
//! notifier, and the observer API, then runs until `Ctrl-C` or an
//! operator stop.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `plantsim-config.yaml` (or `PLANTSIM_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the historian and the role-based permission gate
//! 4. Bootstrap the demo address space and resolve every handle
//! 5. Register event subscribers (log + observer journal)
//! 6. Spawn the simulators on the scheduler
//! 7. Start the Observer API server
//! 8. Wait for `Ctrl-C` or an operator stop, then shut down cleanly

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use plantsim_core::clock::{Clock, SystemClock};
use plantsim_core::config::{LoggingConfig, SimulationConfig};
use plantsim_core::operator::OperatorState;
use plantsim_core::plant::{bootstrap, build_scheduler, ring_historian, user_table};
use plantsim_core::task::EngineContext;
use plantsim_events::{EventNotifier, LogSubscriber};
use plantsim_model::RoleGate;
use plantsim_observer::AppState;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::ServerError;

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "PLANTSIM_CONFIG";
/// Configuration file used when `PLANTSIM_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "plantsim-config.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config_path = config_path();
    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!(
        path = %config_path.display(),
        observer = %config.server.bind_address(),
        historian_capacity = config.historian.capacity,
        users = config.users.len(),
        "plantsim-server starting"
    );

    run(config).await.context("plantsim-server failed")?;

    info!("plantsim-server shutdown complete");
    Ok(())
}

async fn run(config: SimulationConfig) -> Result<(), ServerError> {
    // 3. Historian and permission gate.
    let historian = Arc::new(ring_historian(&config)?);
    let gate = Arc::new(RoleGate::new(Arc::new(user_table(&config.users))));

    // 4. Address space; an unresolvable demo node is fatal here.
    let (space, handles) = bootstrap(&config, historian.clone(), gate)?;
    let space = Arc::new(space);

    // 5. Subscribers.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let operator = Arc::new(OperatorState::new());
    let state = AppState::with_capacity(
        Arc::clone(&space),
        config.server.event_log_size,
        config.server.broadcast_capacity,
    )
    .with_historian(historian)
    .with_operator(Arc::clone(&operator))
    .with_clock(Arc::clone(&clock));
    let notifier = Arc::new(EventNotifier::new());
    notifier.subscribe(Arc::new(LogSubscriber));
    notifier.subscribe(Arc::new(state.subscriber()));
    info!(
        subscribers = notifier.subscriber_count(),
        "Event subscribers registered"
    );

    // 6. Simulators.
    let scheduler = build_scheduler(&config, &handles, clock.as_ref())?;
    let ctx = EngineContext {
        space,
        notifier,
        clock,
    };
    let scheduler = scheduler.spawn(&ctx, &operator);

    // 7. Observer API. It stops together with the operator.
    let state = Arc::new(state.with_scheduler_stats(scheduler.stats()));
    let observer = plantsim_observer::spawn_observer(
        &config.server.bind_address(),
        state,
        operator.child_token(),
    )
    .await?;
    info!(address = %observer.address, "Observer API server started");

    // 8. Run until interrupted.
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for Ctrl-C, shutting down");
            } else {
                info!("Ctrl-C received, shutting down");
            }
        }
        () = operator.stopped() => {
            info!("Operator stop received, shutting down");
        }
    }

    operator.request_stop();
    scheduler.join().await;
    if let Err(e) = observer.handle.await {
        warn!(error = %e, "Observer task ended abnormally");
    }

    Ok(())
}

/// Configuration path from `PLANTSIM_CONFIG`, or the default file name.
fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load the configuration at `path`.
///
/// A missing file yields the defaults (environment overrides still
/// apply); a file that exists but does not parse or validate is an error.
fn load_config(path: &Path) -> Result<SimulationConfig, ServerError> {
    if path.exists() {
        Ok(SimulationConfig::from_file(path)?)
    } else {
        Ok(SimulationConfig::parse("")?)
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `logging.level`.
fn init_logging(logging: &LoggingConfig) -> Result<(), ServerError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| ServerError::Logging {
            message: format!("invalid log level {:?}: {e}", logging.level),
        })?;

    let installed = if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };
    installed.map_err(|e| ServerError::Logging {
        message: e.to_string(),
    })
}
