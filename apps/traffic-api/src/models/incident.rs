use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Reported,
    Investigating,
    InProgress,
    Resolved,
    Closed,
}

impl IncidentStatus {
    /// Resolved and closed incidents drop out of the periodic incident broadcast.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Resolved | Self::Closed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncidentLocation {
    pub zone: String,
    #[serde(default)]
    pub intersection_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub location: IncidentLocation,
    pub description: String,
    #[serde(default)]
    pub reported_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/v1/incidents`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewIncident {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub location: IncidentLocation,
    pub description: String,
}

impl NewIncident {
    pub fn into_incident(self, id: String, reported_by: &str) -> Incident {
        let now = Utc::now();
        Incident {
            id,
            kind: self.kind,
            severity: self.severity,
            status: IncidentStatus::Reported,
            location: self.location,
            description: self.description,
            reported_by: Some(reported_by.to_string()),
            created_at: now,
            updated_at: now,
        }
    }
}
