use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CongestionLevel {
    Low,
    Medium,
    High,
    Severe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadingLocation {
    pub zone: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// One sensor reading from an intersection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrafficReading {
    pub id: String,
    pub intersection_id: String,
    pub location: ReadingLocation,
    pub vehicle_count: u32,
    pub average_speed: f64,
    pub congestion_level: CongestionLevel,
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /api/v1/traffic`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTrafficReading {
    pub intersection_id: String,
    pub location: ReadingLocation,
    pub vehicle_count: u32,
    pub average_speed: f64,
    pub congestion_level: CongestionLevel,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl NewTrafficReading {
    pub fn into_reading(self, id: String) -> TrafficReading {
        TrafficReading {
            id,
            intersection_id: self.intersection_id,
            location: self.location,
            vehicle_count: self.vehicle_count,
            average_speed: self.average_speed,
            congestion_level: self.congestion_level,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        }
    }
}
