//! Gateway event names and wire-format messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GatewayError;
use crate::models::incident::{IncidentStatus, Severity};

// ---------------------------------------------------------------------------
// Server → Client message
// ---------------------------------------------------------------------------

/// A message pushed from the server to a client over WebSocket.
///
/// Immutable once built; the same `Arc<ServerEvent>` is shared by every
/// session a broadcast reaches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerEvent {
    pub event: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl ServerEvent {
    pub fn new(event: &str, data: Value) -> Self {
        Self {
            event: event.to_string(),
            data,
            timestamp: Utc::now(),
        }
    }

    /// Build an `error` event scoped to one session.
    pub fn error(err: &GatewayError, request_id: Option<&Value>) -> Self {
        let mut data = serde_json::json!({
            "message": err.to_string(),
            "code": err.code(),
        });
        if let Some(id) = request_id {
            data["requestId"] = id.clone();
        }
        Self::new(EventName::ERROR, data)
    }
}

/// Event names dispatched to clients.
pub struct EventName;

impl EventName {
    pub const CONNECTED: &'static str = "connected";
    pub const ROOM_JOINED: &'static str = "room_joined";
    pub const ROOM_LEFT: &'static str = "room_left";
    pub const TRAFFIC_DATA_RESPONSE: &'static str = "traffic_data_response";
    pub const INCIDENT_DATA_RESPONSE: &'static str = "incident_data_response";
    pub const TRAFFIC_UPDATE: &'static str = "traffic_update";
    pub const INCIDENT_UPDATE: &'static str = "incident_update";
    pub const EMERGENCY_ALERT: &'static str = "emergency_alert";
    pub const SYSTEM_ALERT: &'static str = "system_alert";
    pub const TRAFFIC_CONTROL_COMMAND: &'static str = "traffic_control_command";
    pub const COMMAND_ACKNOWLEDGED: &'static str = "command_acknowledged";
    pub const TRAFFIC_BROADCAST: &'static str = "traffic_broadcast";
    pub const INCIDENT_BROADCAST: &'static str = "incident_broadcast";
    pub const SYSTEM_HEALTH: &'static str = "system_health";
    pub const PONG: &'static str = "pong";
    pub const ERROR: &'static str = "error";
}

// ---------------------------------------------------------------------------
// Client → Server message
// ---------------------------------------------------------------------------

/// An event received from a client: `{"event": "<name>", "data": {...}}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinRoom(RoomRequest),
    LeaveRoom(RoomRequest),
    RequestTrafficData(TrafficDataRequest),
    RequestIncidentData(IncidentDataRequest),
    TrafficControlCommand(ControlCommand),
    EmergencyAlert(EmergencyAlertRequest),
    /// Any payload is ignored; `data` may be absent, null, or an object.
    Ping(#[serde(default)] Option<Value>),
}

/// Parse a text frame into a [`ClientEvent`].
pub fn parse_client_event(text: &str) -> Result<ClientEvent, GatewayError> {
    serde_json::from_str(text).map_err(|e| GatewayError::InvalidPayload(e.to_string()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomRequest {
    pub room: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficDataRequest {
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub intersection_id: Option<String>,
    #[serde(default = "default_time_range_hours")]
    pub time_range_hours: u32,
    /// Echoed back verbatim so the client can match the response.
    #[serde(default)]
    pub request_id: Option<Value>,
}

fn default_time_range_hours() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentDataRequest {
    #[serde(default)]
    pub status: Option<IncidentStatus>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub request_id: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlCommand {
    pub command: String,
    #[serde(default)]
    pub intersection_id: Option<String>,
    #[serde(default)]
    pub parameters: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyAlertRequest {
    pub alert_type: String,
    pub message: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub affected_zones: Vec<String>,
}

fn default_priority() -> String {
    "high".to_string()
}
