//! Integration tests for the Observer API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, over the real demo address space. Events come
//! from real simulator ticks delivered through the engine's notifier.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, TimeDelta, Utc};
use plantsim_core::alarm::{AlarmBinding, AlarmSeverities, LimitAlarm};
use plantsim_core::clock::{Clock, ManualClock};
use plantsim_core::condition::ConditionSimulator;
use plantsim_core::config::SimulationConfig;
use plantsim_core::operator::OperatorState;
use plantsim_core::sawtooth::OverrideSimulator;
use plantsim_core::plant::{DemoHandles, bootstrap, ring_historian, user_table};
use plantsim_core::task::{EngineContext, SimulationTask};
use plantsim_events::EventNotifier;
use plantsim_model::RoleGate;
use plantsim_model::bootstrap::{CONDITION, LEVEL_ALARM, RAMP};
use plantsim_observer::handlers::{PASSWORD_HEADER, USER_HEADER};
use plantsim_observer::router::build_router;
use plantsim_observer::spawn_observer;
use plantsim_observer::state::AppState;
use plantsim_types::NodeId;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

struct Harness {
    state: Arc<AppState>,
    ctx: EngineContext,
    handles: DemoHandles,
    config: SimulationConfig,
    clock: Arc<ManualClock>,
}

fn harness() -> Harness {
    let config = SimulationConfig::default();
    let historian = Arc::new(ring_historian(&config).unwrap());
    let gate = Arc::new(RoleGate::new(Arc::new(user_table(&config.users))));
    let (space, handles) = bootstrap(&config, historian.clone(), gate).unwrap();
    let space = Arc::new(space);
    let clock = Arc::new(ManualClock::new(Utc::now()));

    let state = AppState::new(Arc::clone(&space), config.server.event_log_size)
        .with_historian(historian)
        .with_operator(Arc::new(OperatorState::new()))
        .with_clock(clock.clone());

    let notifier = Arc::new(EventNotifier::new());
    notifier.subscribe(Arc::new(state.subscriber()));

    Harness {
        state: Arc::new(state),
        ctx: EngineContext {
            space,
            notifier,
            clock: clock.clone(),
        },
        handles,
        config,
        clock,
    }
}

impl Harness {
    async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.send(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    async fn post(&self, path: &str) -> (StatusCode, Value) {
        self.send(Request::post(path).body(Body::empty()).unwrap())
            .await
    }

    async fn put(&self, path: &str, body: &Value, user: Option<(&str, &str)>) -> (StatusCode, Value) {
        let mut request = Request::put(path).header("content-type", "application/json");
        if let Some((name, password)) = user {
            request = request
                .header(USER_HEADER, name)
                .header(PASSWORD_HEADER, password);
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(Arc::clone(&self.state))
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn condition(&self) -> ConditionSimulator {
        ConditionSimulator::new(
            self.handles.condition,
            NodeId::new(CONDITION),
            "Condition".to_owned(),
            self.config.condition.clone(),
            Duration::from_secs(15),
            Utc::now(),
        )
    }

    fn level_alarm(&self) -> LimitAlarm {
        LimitAlarm::new(
            AlarmBinding {
                handle: self.handles.level_alarm,
                node_id: NodeId::new(LEVEL_ALARM),
                display_name: "Level Alarm".to_owned(),
                input: self.handles.ramp,
                input_id: NodeId::new(RAMP),
            },
            self.config.alarm.thresholds().unwrap(),
            self.config.alarm.raise_policy,
            AlarmSeverities {
                normal: self.config.alarm.normal_severity,
                limit: self.config.alarm.limit_severity,
                critical: self.config.alarm.critical_severity,
            },
            Duration::from_secs(1),
            Utc::now(),
        )
    }
}

fn double(v: f64) -> Value {
    json!({ "type": "Double", "value": v })
}

// =========================================================================
// Status page and routing
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let h = harness();
    let response = build_router(Arc::clone(&h.state))
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_nonexistent_route_returns_404() {
    let h = harness();
    let (status, _) = h.get("/api/nonexistent").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =========================================================================
// Variables
// =========================================================================

#[tokio::test]
async fn test_list_variables() {
    let h = harness();
    let (status, json) = h.get("/api/variables").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 5);
}

#[tokio::test]
async fn test_get_variable() {
    let h = harness();
    let (status, json) = h.get("/api/variables/Demo.Counter").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], json!({ "type": "UInt32", "value": 100 }));
    assert_eq!(json["historized"], true);
    assert_eq!(json["computed"], false);
}

#[tokio::test]
async fn test_get_unknown_variable_is_404() {
    let h = harness();
    let (status, json) = h.get("/api/variables/Demo.Nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_object_node_is_not_a_variable() {
    let h = harness();
    let (status, _) = h.get("/api/variables/Demo.Condition").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_anonymous_write_is_denied() {
    let h = harness();
    let (status, json) = h
        .put("/api/variables/Demo.OverridePercentage", &double(42.0), None)
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(json["error"].as_str().unwrap().contains("BadUserAccessDenied"));
}

#[tokio::test]
async fn test_bad_password_is_denied() {
    let h = harness();
    let (status, _) = h
        .put(
            "/api/variables/Demo.OverridePercentage",
            &double(42.0),
            Some(("operator", "wrong")),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_operator_write_is_accepted_and_historized() {
    let h = harness();
    let (status, json) = h
        .put(
            "/api/variables/Demo.OverridePercentage",
            &double(42.0),
            Some(("operator", "operator")),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], double(42.0));

    let (status, json) = h
        .get("/api/variables/Demo.OverridePercentage/history?limit=1")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["records"][0]["value"], double(42.0));
}

#[tokio::test]
async fn test_history_timestamps_follow_the_engine_clock() {
    let h = harness();
    let external_at = h.clock.now();
    let (status, _) = h
        .put(
            "/api/variables/Demo.OverridePercentage",
            &double(40.0),
            Some(("operator", "operator")),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    h.clock.advance(TimeDelta::seconds(30));
    let tick_at = h.clock.now();
    let mut sim = OverrideSimulator::new(
        h.handles.override_percentage,
        NodeId::new("Demo.OverridePercentage"),
        h.config.override_percentage.clone(),
        Duration::from_secs(1),
    );
    sim.tick(&h.ctx).unwrap();

    let (status, json) = h
        .get("/api/variables/Demo.OverridePercentage/history")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    let stamp = |i: usize| {
        DateTime::parse_from_rfc3339(json["records"][i]["timestamp"].as_str().unwrap())
            .unwrap()
            .with_timezone(&Utc)
    };
    assert_eq!(stamp(0), external_at);
    assert_eq!(json["records"][0]["value"], double(40.0));
    assert_eq!(stamp(1), tick_at);
    assert_eq!(json["records"][1]["value"], double(45.0));
}

#[tokio::test]
async fn test_out_of_range_write_is_rejected() {
    let h = harness();
    let (status, _) = h
        .put(
            "/api/variables/Demo.OverridePercentage",
            &double(150.0),
            Some(("operator", "operator")),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, json) = h.get("/api/variables/Demo.OverridePercentage").await;
    assert_eq!(json["value"], double(0.0));
}

#[tokio::test]
async fn test_type_mismatch_is_rejected() {
    let h = harness();
    let (status, _) = h
        .put(
            "/api/variables/Demo.OverridePercentage",
            &json!({ "type": "Boolean", "value": true }),
            Some(("engineer", "engineer")),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_computed_variable_is_not_writable() {
    let h = harness();
    let (status, _) = h
        .put("/api/variables/Demo.Ramp", &double(10.0), Some(("admin", "admin")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_password_without_user_is_bad_request() {
    let h = harness();
    let request = Request::put("/api/variables/Demo.Toggle")
        .header("content-type", "application/json")
        .header(PASSWORD_HEADER, "operator")
        .body(Body::from(json!({ "type": "Boolean", "value": true }).to_string()))
        .unwrap();
    let (status, _) = h.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =========================================================================
// Events, conditions, alarms
// =========================================================================

#[tokio::test]
async fn test_condition_events_reach_the_api() {
    let h = harness();
    let mut condition = h.condition();
    condition.tick(&h.ctx).unwrap();

    let (status, json) = h.get("/api/conditions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["conditions"][0]["state"], "Bad");
    assert_eq!(json["conditions"][0]["message"], "Bad!");

    condition.tick(&h.ctx).unwrap();
    let (_, json) = h.get("/api/conditions").await;
    assert_eq!(json["conditions"][0]["state"], "Good");

    let (_, json) = h.get("/api/events?source=Demo.Condition").await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["events"][0]["message"], "Good!");
}

#[tokio::test]
async fn test_alarm_state_follows_the_ramp() {
    let h = harness();
    let mut alarm = h.level_alarm();

    // The demo ramp starts at -20, below the lowlow limit.
    alarm.tick(&h.ctx).unwrap();

    let (status, json) = h.get("/api/alarms").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["active"], 1);
    assert_eq!(json["alarms"][0]["band"], "LowLow");
    assert_eq!(json["alarms"][0]["input"], "Demo.Ramp");
}

#[tokio::test]
async fn test_events_limit() {
    let h = harness();
    let mut condition = h.condition();
    for _ in 0..3 {
        condition.tick(&h.ctx).unwrap();
    }

    let (_, json) = h.get("/api/events?limit=2").await;
    assert_eq!(json["count"], 2);
    let (_, json) = h.get("/api/events?source=Demo.LevelAlarm").await;
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn test_live_stream_receives_events() {
    let h = harness();
    let mut rx = h.state.subscribe();
    h.condition().tick(&h.ctx).unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(event.source, NodeId::new(CONDITION));
}

// =========================================================================
// Operator
// =========================================================================

#[tokio::test]
async fn test_operator_pause_resume_stop() {
    let h = harness();

    let (status, json) = h.post("/api/operator/pause").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], true);

    let (_, json) = h.get("/api/operator/status").await;
    assert_eq!(json["paused"], true);
    assert!(json["tasks"].is_array());

    h.post("/api/operator/resume").await;
    let (_, json) = h.get("/api/operator/status").await;
    assert_eq!(json["paused"], false);

    h.post("/api/operator/stop").await;
    let operator = h.state.operator_state.as_ref().unwrap();
    assert!(operator.is_stop_requested());
}

#[tokio::test]
async fn test_operator_routes_need_operator_state() {
    let h = harness();
    let bare = AppState::new(Arc::clone(&h.state.space), 10);
    let response = build_router(Arc::new(bare))
        .oneshot(Request::post("/api/operator/pause").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_disabled_node_is_refused() {
    let h = harness();
    let (status, _) = h.post("/api/operator/nodes/Demo.Toggle/disable").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = h.get("/api/variables/Demo.Toggle").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, json) = h.get("/api/variables").await;
    let toggle = json["variables"]
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["node_id"] == "Demo.Toggle")
        .unwrap();
    assert_eq!(toggle["enabled"], false);

    h.post("/api/operator/nodes/Demo.Toggle/enable").await;
    let (status, _) = h.get("/api/variables/Demo.Toggle").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_list_nodes() {
    let h = harness();
    let (status, json) = h.get("/api/nodes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 3);
}

// =========================================================================
// Server lifecycle
// =========================================================================

#[tokio::test]
async fn test_spawned_observer_shuts_down_on_cancel() {
    let h = harness();
    let shutdown = CancellationToken::new();
    let observer = spawn_observer("127.0.0.1:0", Arc::clone(&h.state), shutdown.clone())
        .await
        .unwrap();
    assert_ne!(observer.address.port(), 0);

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), observer.handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_invalid_address_is_reported() {
    let h = harness();
    let result = spawn_observer("not an address", h.state, CancellationToken::new()).await;
    assert!(result.is_err());
}
