use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::incident::Severity;

/// A system-wide notice pushed to every connected dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemAlert {
    pub id: String,
    pub alert_type: String,
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}
