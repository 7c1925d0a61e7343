//! Persistence collaborator for users, readings, and incidents.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Deserialize;

use crate::models::incident::{Incident, IncidentStatus, Severity};
use crate::models::reading::TrafficReading;
use crate::models::user::User;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid seed data: {0}")]
    Seed(String),
}

/// Filter for reading lookups. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct ReadingQuery {
    pub zone: Option<String>,
    pub intersection_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub limit: usize,
}

/// Filter for incident lookups. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct IncidentQuery {
    pub status: Option<IncidentStatus>,
    pub severity: Option<Severity>,
    pub zone: Option<String>,
    /// Exclude resolved and closed incidents.
    pub active_only: bool,
    pub limit: usize,
}

/// Abstraction over the document store backing the dashboard.
///
/// The gateway only ever reads from it (identity lookups, data requests,
/// scheduled snapshots); the REST layer also writes.
#[async_trait]
pub trait TrafficStore: Send + Sync {
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError>;
    async fn insert_reading(&self, reading: TrafficReading) -> Result<(), StoreError>;
    async fn query_readings(&self, query: &ReadingQuery) -> Result<Vec<TrafficReading>, StoreError>;
    async fn insert_incident(&self, incident: Incident) -> Result<(), StoreError>;
    async fn update_incident_status(
        &self,
        id: &str,
        status: IncidentStatus,
    ) -> Result<Option<Incident>, StoreError>;
    async fn query_incidents(&self, query: &IncidentQuery) -> Result<Vec<Incident>, StoreError>;
}

/// Initial contents for a [`MemoryStore`], usually read from `SEED_DATA_PATH`.
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub readings: Vec<TrafficReading>,
    #[serde(default)]
    pub incidents: Vec<Incident>,
}

impl SeedData {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Seed(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw).map_err(|e| StoreError::Seed(format!("{}: {e}", path.display())))
    }
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Collections {
    users: HashMap<String, User>,
    readings: Vec<TrafficReading>,
    incidents: Vec<Incident>,
}

pub struct MemoryStore {
    data: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(Collections::default()),
        }
    }

    pub fn from_seed(seed: SeedData) -> Self {
        let store = Self::new();
        {
            let mut data = store.data.write();
            data.users = seed.users.into_iter().map(|u| (u.id.clone(), u)).collect();
            data.readings = seed.readings;
            data.incidents = seed.incidents;
        }
        store
    }

    pub fn insert_user(&self, user: User) {
        self.data.write().users.insert(user.id.clone(), user);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrafficStore for MemoryStore {
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.data.read().users.get(id).cloned())
    }

    async fn insert_reading(&self, reading: TrafficReading) -> Result<(), StoreError> {
        self.data.write().readings.push(reading);
        Ok(())
    }

    async fn query_readings(&self, query: &ReadingQuery) -> Result<Vec<TrafficReading>, StoreError> {
        let data = self.data.read();
        let mut out: Vec<TrafficReading> = data
            .readings
            .iter()
            .filter(|r| query.zone.as_deref().map_or(true, |z| r.location.zone == z))
            .filter(|r| {
                query
                    .intersection_id
                    .as_deref()
                    .map_or(true, |id| r.intersection_id == id)
            })
            .filter(|r| query.since.map_or(true, |since| r.timestamp >= since))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out.truncate(query.limit);
        Ok(out)
    }

    async fn insert_incident(&self, incident: Incident) -> Result<(), StoreError> {
        self.data.write().incidents.push(incident);
        Ok(())
    }

    async fn update_incident_status(
        &self,
        id: &str,
        status: IncidentStatus,
    ) -> Result<Option<Incident>, StoreError> {
        let mut data = self.data.write();
        let Some(incident) = data.incidents.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        incident.status = status;
        incident.updated_at = Utc::now();
        Ok(Some(incident.clone()))
    }

    async fn query_incidents(&self, query: &IncidentQuery) -> Result<Vec<Incident>, StoreError> {
        let data = self.data.read();
        let mut out: Vec<Incident> = data
            .incidents
            .iter()
            .filter(|i| !query.active_only || i.status.is_active())
            .filter(|i| query.status.map_or(true, |s| i.status == s))
            .filter(|i| query.severity.map_or(true, |s| i.severity == s))
            .filter(|i| query.zone.as_deref().map_or(true, |z| i.location.zone == z))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out.truncate(query.limit);
        Ok(out)
    }
}

/// A store whose every call fails, for exercising upstream-failure paths.
#[cfg(test)]
pub(crate) struct UnavailableStore;

#[cfg(test)]
#[async_trait]
impl TrafficStore for UnavailableStore {
    async fn find_user(&self, _id: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn insert_reading(&self, _reading: TrafficReading) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn query_readings(&self, _query: &ReadingQuery) -> Result<Vec<TrafficReading>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn insert_incident(&self, _incident: Incident) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn update_incident_status(
        &self,
        _id: &str,
        _status: IncidentStatus,
    ) -> Result<Option<Incident>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn query_incidents(&self, _query: &IncidentQuery) -> Result<Vec<Incident>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}
