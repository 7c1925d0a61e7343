//! Incident reporting and status changes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use traffic_common::IdKind;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::models::incident::{Incident, IncidentStatus, NewIncident};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/incidents", post(create_incident))
        .route("/incidents/{incident_id}/status", patch(update_status))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: IncidentStatus,
}

// ---------------------------------------------------------------------------
// POST /api/v1/incidents
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/incidents",
    tag = "Incidents",
    security(("bearer" = [])),
    request_body = NewIncident,
    responses(
        (status = 201, description = "Incident reported and broadcast", body = Incident),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Account inactive", body = ApiErrorBody),
        (status = 503, description = "Store unavailable", body = ApiErrorBody),
    ),
)]
pub async fn create_incident(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<NewIncident>,
) -> Result<(StatusCode, Json<Incident>), ApiError> {
    if body.description.trim().is_empty() {
        return Err(ApiError::validation(vec![FieldError {
            field: "description".to_string(),
            message: "must not be empty".to_string(),
        }]));
    }

    let incident = body.into_incident(IdKind::Incident.generate(), &user.id);
    state.store.insert_incident(incident.clone()).await?;

    let reached = state.hub.dispatcher.broadcast_incident_update(&incident);
    tracing::info!(
        incident_id = %incident.id,
        severity = ?incident.severity,
        user_id = %user.id,
        reached,
        "incident reported"
    );

    Ok((StatusCode::CREATED, Json(incident)))
}

// ---------------------------------------------------------------------------
// PATCH /api/v1/incidents/:incident_id/status
// ---------------------------------------------------------------------------

#[utoipa::path(
    patch,
    path = "/api/v1/incidents/{incident_id}/status",
    tag = "Incidents",
    security(("bearer" = [])),
    params(("incident_id" = String, Path, description = "Incident ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated and broadcast", body = Incident),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
        (status = 404, description = "Incident not found", body = ApiErrorBody),
        (status = 503, description = "Store unavailable", body = ApiErrorBody),
    ),
)]
pub async fn update_status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(incident_id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Incident>, ApiError> {
    if !user.role.is_operations() {
        return Err(ApiError::forbidden("Only operators can change incident status"));
    }

    let incident = state
        .store
        .update_incident_status(&incident_id, body.status)
        .await?
        .ok_or_else(|| ApiError::not_found("Incident not found"))?;

    state.hub.dispatcher.broadcast_incident_update(&incident);
    tracing::info!(
        %incident_id,
        status = ?incident.status,
        user_id = %user.id,
        "incident status changed"
    );

    Ok(Json(incident))
}
