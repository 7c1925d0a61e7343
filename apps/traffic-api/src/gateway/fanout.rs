//! Broadcast dispatcher: delivers events to room members.
//!
//! Fan-out is synchronous: when `emit` returns, every session that was a
//! member of a targeted room at that moment has the event in its outbound
//! queue. A session in several targeted rooms receives the event once.

use std::sync::Arc;

use serde::Serialize;

use crate::models::alert::SystemAlert;
use crate::models::incident::Incident;
use crate::models::reading::TrafficReading;

use super::events::{EventName, ServerEvent};
use super::registry::{SessionRegistry, Target};
use super::rooms::Room;

#[derive(Serialize)]
struct AlertEnvelope<'a> {
    alert: &'a SystemAlert,
}

/// Cloneable handle for pushing events; also the contract the REST layer
/// calls after successful writes.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver an event to every member of the given rooms. Returns the
    /// number of sessions reached.
    pub fn emit(&self, event: ServerEvent, rooms: &[Room]) -> usize {
        let event = Arc::new(event);
        let reached = self.registry.deliver(Target::Rooms(rooms), &event);
        tracing::debug!(event = %event.event, rooms = rooms.len(), reached, "emitted");
        reached
    }

    /// Deliver an event to every connected session.
    pub fn emit_all(&self, event: ServerEvent) -> usize {
        let event = Arc::new(event);
        let reached = self.registry.deliver(Target::All, &event);
        tracing::debug!(event = %event.event, reached, "emitted to all sessions");
        reached
    }

    /// Deliver an event to one session only.
    pub fn send_to(&self, session_id: &str, event: ServerEvent) -> bool {
        self.registry.send_to(session_id, &Arc::new(event))
    }

    /// A new or changed reading: its zone, its intersection, and the operations center.
    pub fn broadcast_traffic_update(&self, reading: &TrafficReading) -> usize {
        let mut rooms = vec![Room::OperationsCenter];
        match Room::zone(&reading.location.zone) {
            Some(room) => rooms.push(room),
            None => tracing::warn!(zone = %reading.location.zone, "reading for unknown zone"),
        }
        match Room::intersection(&reading.intersection_id) {
            Ok(room) => rooms.push(room),
            Err(_) => tracing::warn!(
                intersection_id = %reading.intersection_id,
                "reading with malformed intersection id"
            ),
        }

        self.emit_serialized(EventName::TRAFFIC_UPDATE, reading, Some(rooms.as_slice()))
    }

    /// A new or changed incident: its zone, the emergency team, and the operations center.
    pub fn broadcast_incident_update(&self, incident: &Incident) -> usize {
        let mut rooms = vec![Room::EmergencyTeam, Room::OperationsCenter];
        match Room::zone(&incident.location.zone) {
            Some(room) => rooms.push(room),
            None => tracing::warn!(zone = %incident.location.zone, "incident in unknown zone"),
        }

        self.emit_serialized(EventName::INCIDENT_UPDATE, incident, Some(rooms.as_slice()))
    }

    /// A system-wide alert goes to every connected session.
    pub fn broadcast_system_alert(&self, alert: &SystemAlert) -> usize {
        tracing::info!(alert_id = %alert.id, alert_type = %alert.alert_type, "system alert");
        self.emit_serialized(EventName::SYSTEM_ALERT, &AlertEnvelope { alert }, None)
    }

    /// Serialize `payload` and emit it to `rooms`, or to everyone when `None`.
    /// A payload that fails to serialize is logged and nothing is sent.
    fn emit_serialized<T: Serialize>(
        &self,
        event: &str,
        payload: &T,
        rooms: Option<&[Room]>,
    ) -> usize {
        let data = match serde_json::to_value(payload) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(?e, %event, "failed to serialize broadcast payload");
                return 0;
            }
        };
        let event = ServerEvent::new(event, data);
        match rooms {
            Some(rooms) => self.emit(event, rooms),
            None => self.emit_all(event),
        }
    }

    pub fn connected_session_count(&self) -> usize {
        self.registry.len()
    }
}
