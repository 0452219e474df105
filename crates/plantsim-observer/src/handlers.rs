//! REST API endpoint handlers for the Observer server.
//!
//! Variable reads go straight to the address space; events, conditions and
//! alarms are served from the [`EventJournal`](crate::journal::EventJournal).
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/variables` | List all variables with current values |
//! | `GET` | `/api/variables/:id` | Single variable |
//! | `PUT` | `/api/variables/:id` | External write through the permission gate |
//! | `GET` | `/api/variables/:id/history` | Historian records |
//! | `GET` | `/api/events` | Recently delivered events |
//! | `GET` | `/api/conditions` | Latest condition state |
//! | `GET` | `/api/alarms` | Latest alarm state |
//! | `GET` | `/api/nodes` | Object nodes (conditions, alarms, event sources) |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse};
use plantsim_model::{Credentials, Variable, VariableHandle};
use plantsim_types::{NodeId, Value};
use tracing::info;

use crate::error::ObserverError;
use crate::state::AppState;

/// Header carrying the user name for external writes.
pub const USER_HEADER: &str = "x-plantsim-user";
/// Header carrying the password for external writes.
pub const PASSWORD_HEADER: &str = "x-plantsim-password";

const DEFAULT_EVENT_LIMIT: usize = 100;
const MAX_EVENT_LIMIT: usize = 1000;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/events` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct EventsQuery {
    /// Only events raised by this node.
    pub source: Option<String>,
    /// Maximum number of events to return (default 100).
    pub limit: Option<usize>,
}

/// Query parameters for the history endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct HistoryQuery {
    /// Only the newest `limit` records.
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing server status and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let nodes = state.space.node_count();
    let events = state.journal.len();
    let active_alarms = state.journal.alarms().iter().filter(|a| a.active).count();
    let status = match &state.operator_state {
        Some(op) if op.is_stop_requested() => "STOPPING",
        Some(op) if op.is_paused() => "PAUSED",
        _ => "RUNNING",
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>plantsim observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .status {{ color: #3fb950; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>plantsim observer</h1>
    <p>Status: <span class="status">{status}</span></p>
    <div>
        <div class="metric"><div class="label">Nodes</div><div class="value">{nodes}</div></div>
        <div class="metric"><div class="label">Events</div><div class="value">{events}</div></div>
        <div class="metric"><div class="label">Active alarms</div><div class="value">{active_alarms}</div></div>
    </div>
    <ul>
        <li><a href="/api/variables">/api/variables</a></li>
        <li><a href="/api/events">/api/events</a></li>
        <li><a href="/api/conditions">/api/conditions</a></li>
        <li><a href="/api/alarms">/api/alarms</a></li>
        <li><a href="/api/nodes">/api/nodes</a></li>
        <li><a href="/api/operator/status">/api/operator/status</a></li>
        <li>/ws/events (WebSocket)</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

fn variable_json(variable: &Variable) -> serde_json::Value {
    let def = variable.definition();
    serde_json::json!({
        "node_id": def.node_id,
        "display_name": def.display_name,
        "data_type": def.data_type,
        "value": variable.read(),
        "range": def.range,
        "access": def.access,
        "write_roles": def.write_roles,
        "historized": def.historized,
        "computed": variable.is_computed(),
        "enabled": variable.is_enabled(),
    })
}

fn resolve(state: &AppState, id: String) -> Result<VariableHandle, ObserverError> {
    Ok(state.space.resolve_variable(&NodeId::new(id))?)
}

/// List every variable with its current value.
pub async fn list_variables(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let variables: Vec<serde_json::Value> = state
        .space
        .variables()
        .map(|(_, v)| variable_json(v))
        .collect();

    Ok(Json(serde_json::json!({
        "count": variables.len(),
        "variables": variables,
    })))
}

/// Return a single variable.
pub async fn get_variable(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let handle = resolve(&state, id)?;
    let variable = state.space.variable(handle)?;
    Ok(Json(variable_json(variable)))
}

/// Write a variable on behalf of an external client.
///
/// The body is a tagged [`Value`], e.g. `{"type":"Double","value":42.0}`.
/// Credentials are taken from the `x-plantsim-user` and
/// `x-plantsim-password` headers; without them the write is anonymous.
pub async fn put_variable(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(value): Json<Value>,
) -> Result<impl IntoResponse, ObserverError> {
    let handle = resolve(&state, id)?;
    let credentials = credentials(&headers)?;
    state
        .space
        .write_as(credentials.as_ref(), handle, value, state.clock.now())?;

    let variable = state.space.variable(handle)?;
    info!(
        node = %variable.definition().node_id,
        user = credentials.as_ref().map_or("anonymous", |c| c.user.as_str()),
        "External write accepted"
    );
    Ok(Json(variable_json(variable)))
}

fn credentials(headers: &HeaderMap) -> Result<Option<Credentials>, ObserverError> {
    let text = |name: &str| {
        headers
            .get(name)
            .map(|v| {
                v.to_str()
                    .map_err(|e| ObserverError::BadRequest(format!("{name}: {e}")))
            })
            .transpose()
    };
    match (text(USER_HEADER)?, text(PASSWORD_HEADER)?) {
        (Some(user), password) => Ok(Some(Credentials::new(user, password.unwrap_or("")))),
        (None, Some(_)) => Err(ObserverError::BadRequest(format!(
            "{PASSWORD_HEADER} given without {USER_HEADER}"
        ))),
        (None, None) => Ok(None),
    }
}

/// Return historian records for a variable, oldest first.
pub async fn variable_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let historian = state
        .historian
        .as_ref()
        .ok_or_else(|| ObserverError::Unavailable("historian not attached".to_owned()))?;
    let handle = resolve(&state, id)?;
    let definition = state.space.variable(handle)?.definition();

    let mut records = historian.history(&definition.node_id);
    if let Some(limit) = params.limit {
        let skip = records.len().saturating_sub(limit);
        records = records.split_off(skip);
    }

    Ok(Json(serde_json::json!({
        "node_id": definition.node_id,
        "historized": definition.historized,
        "count": records.len(),
        "records": records,
    })))
}

// ---------------------------------------------------------------------------
// Events, conditions, alarms
// ---------------------------------------------------------------------------

/// Recently delivered events, newest first.
///
/// # Query Parameters
///
/// - `source`: only events raised by this node.
/// - `limit`: maximum number of events to return (default 100, max 1000).
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_EVENT_LIMIT)
        .min(MAX_EVENT_LIMIT);
    let source = params.source.map(NodeId::new);
    let events = state.journal.events(source.as_ref(), limit);

    Ok(Json(serde_json::json!({
        "count": events.len(),
        "events": events,
    })))
}

/// Latest state of every condition.
pub async fn list_conditions(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let conditions = state.journal.conditions();
    Ok(Json(serde_json::json!({
        "count": conditions.len(),
        "conditions": conditions,
    })))
}

/// Latest state of every limit alarm.
pub async fn list_alarms(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let alarms = state.journal.alarms();
    let active = alarms.iter().filter(|a| a.active).count();
    Ok(Json(serde_json::json!({
        "count": alarms.len(),
        "active": active,
        "alarms": alarms,
    })))
}

/// Object nodes with their kind and enabled flag.
pub async fn list_nodes(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let nodes: Vec<serde_json::Value> = state
        .space
        .objects()
        .map(|node| {
            serde_json::json!({
                "node_id": node.node_id(),
                "display_name": node.display_name(),
                "kind": node.kind(),
                "enabled": node.is_enabled(),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "count": nodes.len(),
        "nodes": nodes,
    })))
}
