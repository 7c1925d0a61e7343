//! Operator and emergency command relay.

use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::error::GatewayError;
use crate::models::user::Identity;

use super::events::{ControlCommand, EmergencyAlertRequest, EventName, ServerEvent};
use super::fanout::Dispatcher;
use super::rooms::Room;

/// Outcome of a relayed command, acknowledged back to the issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandReceipt {
    pub command: &'static str,
    pub rooms: Vec<Room>,
    pub recipients: usize,
}

/// Checks the issuer's rights and hands authorized commands to the dispatcher.
/// A rejected command produces no broadcast at all.
#[derive(Clone)]
pub struct CommandGateway {
    dispatcher: Dispatcher,
}

impl CommandGateway {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Relay a traffic control command to its intersection room, or to the
    /// operations center when no intersection is named.
    pub fn traffic_control(
        &self,
        issuer: &Identity,
        cmd: ControlCommand,
    ) -> Result<CommandReceipt, GatewayError> {
        if !issuer.role.is_operations() {
            return Err(GatewayError::Forbidden(
                "Insufficient permissions for traffic control commands".to_string(),
            ));
        }

        let room = match cmd.intersection_id.as_deref() {
            Some(id) => Room::intersection(id)?,
            None => Room::OperationsCenter,
        };

        let data = json!({
            "command": cmd.command,
            "intersectionId": cmd.intersection_id,
            "parameters": cmd.parameters,
            "issuedBy": issued_by(issuer),
            "timestamp": Utc::now(),
        });
        let recipients = self.dispatcher.emit(
            ServerEvent::new(EventName::TRAFFIC_CONTROL_COMMAND, data),
            std::slice::from_ref(&room),
        );

        tracing::info!(
            user_id = %issuer.id,
            command = %cmd.command,
            %room,
            recipients,
            "traffic control command relayed"
        );

        Ok(CommandReceipt {
            command: EventName::TRAFFIC_CONTROL_COMMAND,
            rooms: vec![room],
            recipients,
        })
    }

    /// Relay an emergency alert to the emergency team and every affected zone.
    /// Unknown zone names are skipped.
    pub fn emergency_alert(
        &self,
        issuer: &Identity,
        alert: EmergencyAlertRequest,
    ) -> Result<CommandReceipt, GatewayError> {
        if !issuer.can_raise_emergency() {
            return Err(GatewayError::Forbidden(
                "Insufficient permissions for emergency alerts".to_string(),
            ));
        }

        let mut rooms = vec![Room::EmergencyTeam];
        for zone in &alert.affected_zones {
            match Room::zone(zone) {
                Some(room) if !rooms.contains(&room) => rooms.push(room),
                Some(_) => {}
                None => tracing::warn!(%zone, "emergency alert names unknown zone"),
            }
        }

        let data = json!({
            "alertType": alert.alert_type,
            "message": alert.message,
            "priority": alert.priority,
            "affectedZones": alert.affected_zones,
            "issuedBy": issued_by(issuer),
            "timestamp": Utc::now(),
        });
        let recipients = self
            .dispatcher
            .emit(ServerEvent::new(EventName::EMERGENCY_ALERT, data), &rooms);

        tracing::warn!(
            user_id = %issuer.id,
            alert_type = %alert.alert_type,
            priority = %alert.priority,
            recipients,
            "emergency alert relayed"
        );

        Ok(CommandReceipt {
            command: EventName::EMERGENCY_ALERT,
            rooms,
            recipients,
        })
    }
}

fn issued_by(issuer: &Identity) -> serde_json::Value {
    json!({ "id": issuer.id, "username": issuer.username })
}
