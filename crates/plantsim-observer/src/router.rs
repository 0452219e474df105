//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, operator, ws};

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/events` -- `WebSocket` live event stream
/// - `GET /api/variables`, `GET|PUT /api/variables/{id}`
/// - `GET /api/variables/{id}/history`
/// - `GET /api/events`, `GET /api/conditions`, `GET /api/alarms`
/// - `GET /api/nodes`
/// - `GET /api/operator/status`, `POST /api/operator/{pause,resume,stop}`
/// - `POST /api/operator/nodes/{id}/{enable,disable}`
///
/// CORS allows any origin.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/events", get(ws::ws_events))
        // Address space
        .route("/api/variables", get(handlers::list_variables))
        .route(
            "/api/variables/{id}",
            get(handlers::get_variable).put(handlers::put_variable),
        )
        .route("/api/variables/{id}/history", get(handlers::variable_history))
        .route("/api/nodes", get(handlers::list_nodes))
        // Events
        .route("/api/events", get(handlers::list_events))
        .route("/api/conditions", get(handlers::list_conditions))
        .route("/api/alarms", get(handlers::list_alarms))
        // Operator
        .route("/api/operator/status", get(operator::status))
        .route("/api/operator/pause", post(operator::pause))
        .route("/api/operator/resume", post(operator::resume))
        .route("/api/operator/stop", post(operator::stop))
        .route(
            "/api/operator/nodes/{id}/enable",
            post(operator::enable_node),
        )
        .route(
            "/api/operator/nodes/{id}/disable",
            post(operator::disable_node),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
