//! Operator REST API handlers for runtime engine control.
//!
//! These endpoints are separate from the read-mostly observer API. They
//! provide one-way command authority from the operator to the scheduler.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/operator/status` | Pause/stop state and per-task counters |
//! | `POST` | `/api/operator/pause` | Pause every simulator |
//! | `POST` | `/api/operator/resume` | Resume every simulator |
//! | `POST` | `/api/operator/stop` | Trigger clean shutdown |
//! | `POST` | `/api/operator/nodes/:id/enable` | Re-enable a node |
//! | `POST` | `/api/operator/nodes/:id/disable` | Disable a node |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use plantsim_core::operator::{OperatorState, OperatorStatus};
use plantsim_core::scheduler::TaskStats;
use plantsim_types::NodeId;
use tracing::info;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct OperatorResponse {
    /// Whether the operation succeeded.
    ok: bool,
    /// Human-readable message.
    message: String,
}

/// Body of `GET /api/operator/status`.
#[derive(Debug, serde::Serialize)]
struct StatusResponse {
    #[serde(flatten)]
    operator: OperatorStatus,
    tasks: Vec<TaskStats>,
}

fn operator(state: &AppState) -> Result<&Arc<OperatorState>, ObserverError> {
    state
        .operator_state
        .as_ref()
        .ok_or_else(|| ObserverError::Unavailable("operator state not available".to_owned()))
}

// ---------------------------------------------------------------------------
// GET /api/operator/status
// ---------------------------------------------------------------------------

/// Return pause/stop state, uptime, and the scheduler's per-task counters.
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let operator = operator(&state)?;
    let tasks = state
        .scheduler_stats
        .as_ref()
        .map(plantsim_core::scheduler::SchedulerStats::snapshot)
        .unwrap_or_default();

    Ok(Json(StatusResponse {
        operator: operator.status(),
        tasks,
    }))
}

// ---------------------------------------------------------------------------
// POST /api/operator/pause
// ---------------------------------------------------------------------------

/// Pause every simulator. Timers keep running; ticks are skipped.
pub async fn pause(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.pause();
    info!("Operator paused the engine");

    Ok(Json(OperatorResponse {
        ok: true,
        message: "Simulation paused".to_owned(),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/operator/resume
// ---------------------------------------------------------------------------

/// Resume every simulator after a pause.
pub async fn resume(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.resume();
    info!("Operator resumed the engine");

    Ok(Json(OperatorResponse {
        ok: true,
        message: "Simulation resumed".to_owned(),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/operator/stop
// ---------------------------------------------------------------------------

/// Trigger a clean shutdown.
///
/// Every simulator finishes its current tick and exits. The binary then
/// shuts the observer down.
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ObserverError> {
    operator(&state)?.request_stop();
    info!("Operator requested stop");

    Ok(Json(OperatorResponse {
        ok: true,
        message: "Stop requested -- simulators will exit after their current tick".to_owned(),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/operator/nodes/:id/{enable,disable}
// ---------------------------------------------------------------------------

/// Re-enable a node disabled earlier.
pub async fn enable_node(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    set_enabled(&state, id, true)
}

/// Disable a node. Simulators touching it fail their ticks until it is
/// re-enabled; external reads and writes are refused.
pub async fn disable_node(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    set_enabled(&state, id, false)
}

fn set_enabled(
    state: &AppState,
    id: String,
    enabled: bool,
) -> Result<Json<serde_json::Value>, ObserverError> {
    let node = NodeId::new(id);
    state.space.set_enabled(&node, enabled)?;
    info!(%node, enabled, "Operator changed node state");

    Ok(Json(serde_json::json!({
        "ok": true,
        "node_id": node,
        "enabled": enabled,
    })))
}
