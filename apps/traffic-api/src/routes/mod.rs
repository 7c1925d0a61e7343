pub mod alerts;
pub mod health;
pub mod incidents;
pub mod realtime;
pub mod traffic;

use axum::Router;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(crate::gateway::server::router())
        .nest(
            "/api/v1",
            realtime::router()
                .merge(traffic::router())
                .merge(incidents::router())
                .merge(alerts::router()),
        )
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        realtime::stats,
        traffic::create_reading,
        incidents::create_incident,
        incidents::update_status,
        alerts::create_alert,
    ),
    components(
        schemas(
            // Error types
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            crate::error::FieldError,
            // Models
            crate::models::reading::TrafficReading,
            crate::models::reading::NewTrafficReading,
            crate::models::reading::ReadingLocation,
            crate::models::reading::CongestionLevel,
            crate::models::incident::Incident,
            crate::models::incident::NewIncident,
            crate::models::incident::IncidentLocation,
            crate::models::incident::IncidentStatus,
            crate::models::incident::Severity,
            crate::models::alert::SystemAlert,
            // Route request/response types
            health::HealthResponse,
            realtime::RealtimeStats,
            incidents::UpdateStatusRequest,
            alerts::CreateAlertRequest,
            alerts::AlertDispatched,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Realtime", description = "Gateway state"),
        (name = "Traffic", description = "Sensor readings"),
        (name = "Incidents", description = "Incident reporting"),
        (name = "Alerts", description = "System-wide alerts"),
    )
)]
pub struct ApiDoc;
