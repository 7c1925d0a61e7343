//! Inbound event dispatch for an active session.
//!
//! Every reply goes through the session's own outbound queue, so replies and
//! broadcasts reach the client in the order they were queued.

use chrono::{Duration, Utc};
use serde_json::json;

use crate::db::store::{IncidentQuery, ReadingQuery, TrafficStore};
use crate::error::GatewayError;

use super::events::{
    ClientEvent, EventName, IncidentDataRequest, ServerEvent, TrafficDataRequest,
};
use super::hub::RealtimeHub;
use super::session::Session;

/// Most readings returned for one `request_traffic_data`.
pub const TRAFFIC_RESPONSE_LIMIT: usize = 100;
/// Most incidents returned for one `request_incident_data`.
pub const INCIDENT_RESPONSE_LIMIT: usize = 50;
/// Widest accepted `timeRangeHours` (one week).
pub const MAX_TIME_RANGE_HOURS: u32 = 168;

/// Process one inbound event. Failures are reported to this session only.
pub async fn handle_client_event(
    hub: &RealtimeHub,
    store: &dyn TrafficStore,
    session: &Session,
    event: ClientEvent,
) {
    let session_id = session.session_id.as_str();
    let reply = |ev: ServerEvent| {
        hub.dispatcher.send_to(session_id, ev);
    };

    match event {
        ClientEvent::JoinRoom(req) => match hub.router.join(session_id, &req.room) {
            Ok(room) => reply(ServerEvent::new(EventName::ROOM_JOINED, json!({ "room": room }))),
            Err(err) => {
                tracing::debug!(%session_id, room = %req.room, "rejected room join");
                reply(ServerEvent::error(&err, None));
            }
        },
        ClientEvent::LeaveRoom(req) => {
            hub.router.leave(session_id, &req.room);
            reply(ServerEvent::new(EventName::ROOM_LEFT, json!({ "room": req.room })));
        }
        ClientEvent::RequestTrafficData(req) => match traffic_data(store, &req).await {
            Ok(data) => reply(ServerEvent::new(EventName::TRAFFIC_DATA_RESPONSE, data)),
            Err(err) => {
                tracing::warn!(%session_id, error = %err, "traffic data request failed");
                reply(ServerEvent::error(&err, req.request_id.as_ref()));
            }
        },
        ClientEvent::RequestIncidentData(req) => match incident_data(store, &req).await {
            Ok(data) => reply(ServerEvent::new(EventName::INCIDENT_DATA_RESPONSE, data)),
            Err(err) => {
                tracing::warn!(%session_id, error = %err, "incident data request failed");
                reply(ServerEvent::error(&err, req.request_id.as_ref()));
            }
        },
        ClientEvent::TrafficControlCommand(cmd) => {
            match hub.commands.traffic_control(&session.identity, cmd) {
                Ok(receipt) => reply(ServerEvent::new(
                    EventName::COMMAND_ACKNOWLEDGED,
                    json!(receipt),
                )),
                Err(err) => reply(ServerEvent::error(&err, None)),
            }
        }
        ClientEvent::EmergencyAlert(alert) => {
            match hub.commands.emergency_alert(&session.identity, alert) {
                Ok(receipt) => reply(ServerEvent::new(
                    EventName::COMMAND_ACKNOWLEDGED,
                    json!(receipt),
                )),
                Err(err) => reply(ServerEvent::error(&err, None)),
            }
        }
        ClientEvent::Ping(_) => reply(ServerEvent::new(EventName::PONG, json!({}))),
    }
}

async fn traffic_data(
    store: &dyn TrafficStore,
    req: &TrafficDataRequest,
) -> Result<serde_json::Value, GatewayError> {
    let hours = req.time_range_hours.clamp(1, MAX_TIME_RANGE_HOURS);
    let query = ReadingQuery {
        zone: req.zone.clone(),
        intersection_id: req.intersection_id.clone(),
        since: Some(Utc::now() - Duration::hours(i64::from(hours))),
        limit: TRAFFIC_RESPONSE_LIMIT,
    };
    let readings = store.query_readings(&query).await?;
    Ok(json!({
        "requestId": req.request_id,
        "count": readings.len(),
        "data": readings,
    }))
}

async fn incident_data(
    store: &dyn TrafficStore,
    req: &IncidentDataRequest,
) -> Result<serde_json::Value, GatewayError> {
    let query = IncidentQuery {
        status: req.status,
        severity: req.severity,
        zone: req.zone.clone(),
        active_only: false,
        limit: INCIDENT_RESPONSE_LIMIT,
    };
    let incidents = store.query_incidents(&query).await?;
    Ok(json!({
        "requestId": req.request_id,
        "count": incidents.len(),
        "data": incidents,
    }))
}
