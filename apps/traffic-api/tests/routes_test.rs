mod common;

use std::time::Duration;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::json;

use traffic_api::gateway::events::EventName;
use traffic_api::gateway::lifecycle;
use traffic_api::gateway::session::OutboundReceiver;
use traffic_api::models::user::{Department, Identity, Role};
use traffic_api::AppState;

fn bearer(user_id: &str) -> String {
    format!("Bearer {}", common::token(user_id))
}

/// Register a session straight into the hub, skipping the `connected` welcome.
fn listen(state: &AppState, role: Role, department: Department, rooms: &[&str]) -> OutboundReceiver {
    let identity = Identity {
        id: "usr_listener".into(),
        username: "listener".into(),
        role,
        department,
    };
    let (session, mut rx) = lifecycle::establish(&state.hub, identity, Duration::from_secs(25));
    assert_eq!(rx.try_recv().unwrap().event, EventName::CONNECTED);
    for room in rooms {
        state.hub.router.join(&session.session_id, room).unwrap();
    }
    rx
}

fn reading_body(intersection_id: &str) -> serde_json::Value {
    json!({
        "intersectionId": intersection_id,
        "location": { "zone": "North", "latitude": 40.71, "longitude": -74.0 },
        "vehicleCount": 41,
        "averageSpeed": 22.5,
        "congestionLevel": "high"
    })
}

fn incident_body() -> serde_json::Value {
    json!({
        "type": "accident",
        "severity": "high",
        "location": { "zone": "South", "intersectionId": "INT-4" },
        "description": "Two-car collision blocking the left lane"
    })
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_is_public() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server.get("/health").await;
    resp.assert_status_ok();
    resp.assert_json(&json!({ "status": "ok" }));
}

// ---------------------------------------------------------------------------
// GET /api/v1/realtime/stats
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stats_require_authentication() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server.get("/api/v1/realtime/stats").await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

    let resp = server
        .get("/api/v1/realtime/stats")
        .add_header(AUTHORIZATION, bearer(common::INACTIVE))
        .await;
    resp.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn stats_report_sessions_and_room_sizes() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();
    let _rx = listen(&state, Role::Operator, Department::Operations, &["zone:East"]);

    let resp = server
        .get("/api/v1/realtime/stats")
        .add_header(AUTHORIZATION, bearer(common::VIEWER))
        .await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(body["connectedSessions"], 1);
    assert_eq!(body["rooms"]["general"], 1);
    assert_eq!(body["rooms"]["operations_center"], 1);
    assert_eq!(body["rooms"]["zone:East"], 1);
    assert!(body["rooms"].get("emergency_team").is_none());
}

// ---------------------------------------------------------------------------
// POST /api/v1/traffic
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reading_is_stored_and_broadcast_to_zone() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();
    let mut north = listen(&state, Role::Viewer, Department::Planning, &["zone:North"]);
    let mut elsewhere = listen(&state, Role::Viewer, Department::Planning, &["zone:West"]);

    let resp = server
        .post("/api/v1/traffic")
        .add_header(AUTHORIZATION, bearer(common::OPERATOR))
        .json(&reading_body("INT-12"))
        .await;
    resp.assert_status(StatusCode::CREATED);

    let stored: serde_json::Value = resp.json();
    assert!(stored["id"].as_str().unwrap().starts_with("rdg_"));
    assert_eq!(stored["vehicleCount"], 41);

    let ev = north.try_recv().unwrap();
    assert_eq!(ev.event, EventName::TRAFFIC_UPDATE);
    assert_eq!(ev.data["id"], stored["id"]);
    assert!(north.try_recv().is_err());
    assert!(elsewhere.try_recv().is_err());
}

#[tokio::test]
async fn reading_requires_operations_role() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/api/v1/traffic")
        .add_header(AUTHORIZATION, bearer(common::VIEWER))
        .json(&reading_body("INT-12"))
        .await;
    resp.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn reading_with_malformed_intersection_is_rejected() {
    let (app, _state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/api/v1/traffic")
        .add_header(AUTHORIZATION, bearer(common::ADMIN))
        .json(&reading_body("INT 12 / main"))
        .await;
    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "INVALID_ROOM");
}

// ---------------------------------------------------------------------------
// /api/v1/incidents
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reported_incident_reaches_emergency_team() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();
    let mut team = listen(&state, Role::Viewer, Department::Emergency, &[]);
    let mut planner = listen(&state, Role::Viewer, Department::Planning, &[]);

    let resp = server
        .post("/api/v1/incidents")
        .add_header(AUTHORIZATION, bearer(common::VIEWER))
        .json(&incident_body())
        .await;
    resp.assert_status(StatusCode::CREATED);

    let incident: serde_json::Value = resp.json();
    assert_eq!(incident["status"], "reported");
    assert_eq!(incident["reportedBy"], common::VIEWER);

    let ev = team.try_recv().unwrap();
    assert_eq!(ev.event, EventName::INCIDENT_UPDATE);
    assert_eq!(ev.data["type"], "accident");
    assert!(planner.try_recv().is_err());
}

#[tokio::test]
async fn incident_status_change_is_restricted_and_broadcast() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let created: serde_json::Value = server
        .post("/api/v1/incidents")
        .add_header(AUTHORIZATION, bearer(common::OPERATOR))
        .json(&incident_body())
        .await
        .json();
    let id = created["id"].as_str().unwrap().to_string();
    let mut ops = listen(&state, Role::Operator, Department::Operations, &[]);

    let resp = server
        .patch(&format!("/api/v1/incidents/{id}/status"))
        .add_header(AUTHORIZATION, bearer(common::ANALYST))
        .json(&json!({ "status": "resolved" }))
        .await;
    resp.assert_status(StatusCode::FORBIDDEN);
    assert!(ops.try_recv().is_err());

    let resp = server
        .patch(&format!("/api/v1/incidents/{id}/status"))
        .add_header(AUTHORIZATION, bearer(common::OPERATOR))
        .json(&json!({ "status": "resolved" }))
        .await;
    resp.assert_status_ok();
    let updated: serde_json::Value = resp.json();
    assert_eq!(updated["status"], "resolved");
    assert_eq!(ops.try_recv().unwrap().data["status"], "resolved");

    let resp = server
        .patch("/api/v1/incidents/inc_missing/status")
        .add_header(AUTHORIZATION, bearer(common::ADMIN))
        .json(&json!({ "status": "closed" }))
        .await;
    resp.assert_status(StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// POST /api/v1/alerts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn system_alert_is_admin_only_and_reaches_everyone() {
    let (app, state) = common::test_app();
    let server = TestServer::new(app).unwrap();
    let mut a = listen(&state, Role::Viewer, Department::Planning, &[]);
    let mut b = listen(&state, Role::Analyst, Department::Analytics, &[]);

    let body = json!({ "alertType": "maintenance", "message": "Signal firmware update tonight", "severity": "low" });

    let resp = server
        .post("/api/v1/alerts")
        .add_header(AUTHORIZATION, bearer(common::OPERATOR))
        .json(&body)
        .await;
    resp.assert_status(StatusCode::FORBIDDEN);
    assert!(a.try_recv().is_err());

    let resp = server
        .post("/api/v1/alerts")
        .add_header(AUTHORIZATION, bearer(common::ADMIN))
        .json(&body)
        .await;
    resp.assert_status(StatusCode::ACCEPTED);
    let dispatched: serde_json::Value = resp.json();
    assert_eq!(dispatched["recipients"], 2);
    assert!(dispatched["alert"]["id"].as_str().unwrap().starts_with("alt_"));

    for rx in [&mut a, &mut b] {
        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.event, EventName::SYSTEM_ALERT);
        assert_eq!(ev.data["alert"]["message"], "Signal firmware update tonight");
    }
}
