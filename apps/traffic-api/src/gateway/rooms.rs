//! Room names, validation, and the router that applies joins and leaves.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::error::GatewayError;
use crate::models::user::{Department, Identity};

use super::registry::{Membership, SessionRegistry};

/// Longest accepted intersection id.
const MAX_INTERSECTION_ID_LEN: usize = 64;

/// The five monitored city zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Zone {
    North,
    South,
    East,
    West,
    Central,
}

impl Zone {
    pub const ALL: [Zone; 5] = [Zone::North, Zone::South, Zone::East, Zone::West, Zone::Central];

    pub fn as_str(self) -> &'static str {
        match self {
            Zone::North => "North",
            Zone::South => "South",
            Zone::East => "East",
            Zone::West => "West",
            Zone::Central => "Central",
        }
    }

    /// Exact, case-sensitive match against the known zone names.
    pub fn parse(name: &str) -> Option<Zone> {
        Zone::ALL.into_iter().find(|z| z.as_str() == name)
    }
}

/// A named multicast group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Room {
    General,
    OperationsCenter,
    AnalyticsCenter,
    EmergencyTeam,
    Zone(Zone),
    Intersection(String),
}

impl Room {
    /// Build an intersection room, validating the id.
    pub fn intersection(id: &str) -> Result<Room, GatewayError> {
        if is_valid_intersection_id(id) {
            Ok(Room::Intersection(id.to_string()))
        } else {
            Err(GatewayError::InvalidRoom(format!("intersection:{id}")))
        }
    }

    /// Build a zone room from a zone name, if the zone is known.
    pub fn zone(name: &str) -> Option<Room> {
        Zone::parse(name).map(Room::Zone)
    }
}

/// 1–64 ASCII alphanumerics, `-` or `_`.
pub fn is_valid_intersection_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_INTERSECTION_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

impl FromStr for Room {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => return Ok(Room::General),
            "operations_center" => return Ok(Room::OperationsCenter),
            "analytics_center" => return Ok(Room::AnalyticsCenter),
            "emergency_team" => return Ok(Room::EmergencyTeam),
            _ => {}
        }

        if let Some(name) = s.strip_prefix("zone:") {
            return Room::zone(name).ok_or_else(|| GatewayError::InvalidRoom(s.to_string()));
        }
        if let Some(id) = s.strip_prefix("intersection:") {
            return Room::intersection(id);
        }
        Err(GatewayError::InvalidRoom(s.to_string()))
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::General => f.write_str("general"),
            Room::OperationsCenter => f.write_str("operations_center"),
            Room::AnalyticsCenter => f.write_str("analytics_center"),
            Room::EmergencyTeam => f.write_str("emergency_team"),
            Room::Zone(zone) => write!(f, "zone:{}", zone.as_str()),
            Room::Intersection(id) => write!(f, "intersection:{id}"),
        }
    }
}

impl Serialize for Room {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Rooms every session with this identity is subscribed to on connect.
pub fn default_rooms(identity: &Identity) -> Vec<Room> {
    let mut rooms = vec![Room::General];
    if identity.role.is_operations() {
        rooms.push(Room::OperationsCenter);
    }
    if identity.role.is_analytics() {
        rooms.push(Room::AnalyticsCenter);
    }
    if identity.department == Department::Emergency || identity.role.is_admin() {
        rooms.push(Room::EmergencyTeam);
    }
    rooms
}

/// Applies join/leave requests and default subscriptions to the registry.
#[derive(Clone)]
pub struct RoomRouter {
    registry: Arc<SessionRegistry>,
}

impl RoomRouter {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Join every default room for the session's identity. Returns the rooms joined.
    pub fn assign_default_rooms(&self, session_id: &str, identity: &Identity) -> Vec<Room> {
        let rooms = default_rooms(identity);
        for room in &rooms {
            self.registry.join(session_id, room.clone());
        }
        rooms
    }

    /// Join a room by name. Invalid names leave membership untouched.
    pub fn join(&self, session_id: &str, name: &str) -> Result<Room, GatewayError> {
        let room: Room = name.parse()?;
        match self.registry.join(session_id, room.clone()) {
            Membership::Added => {
                tracing::debug!(%session_id, %room, "joined room");
            }
            Membership::AlreadyMember => {}
            Membership::UnknownSession => {
                tracing::debug!(%session_id, %room, "join for a session that is gone");
            }
        }
        Ok(room)
    }

    /// Leave a room by name. Returns whether a membership was removed; leaving
    /// a room the session is not in, or an unparseable one, is a no-op.
    pub fn leave(&self, session_id: &str, name: &str) -> bool {
        let Ok(room) = name.parse::<Room>() else {
            return false;
        };
        let removed = self.registry.leave(session_id, &room);
        if removed {
            tracing::debug!(%session_id, %room, "left room");
        }
        removed
    }
}
