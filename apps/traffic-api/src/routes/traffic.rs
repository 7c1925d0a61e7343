//! Sensor reading ingestion.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use traffic_common::IdKind;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody};
use crate::gateway::rooms::Room;
use crate::models::reading::{NewTrafficReading, TrafficReading};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/traffic", post(create_reading))
}

// ---------------------------------------------------------------------------
// POST /api/v1/traffic
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/traffic",
    tag = "Traffic",
    security(("bearer" = [])),
    request_body = NewTrafficReading,
    responses(
        (status = 201, description = "Reading stored and broadcast", body = TrafficReading),
        (status = 400, description = "Invalid intersection id", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
        (status = 503, description = "Store unavailable", body = ApiErrorBody),
    ),
)]
pub async fn create_reading(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<NewTrafficReading>,
) -> Result<(StatusCode, Json<TrafficReading>), ApiError> {
    if !user.role.is_operations() {
        return Err(ApiError::forbidden("Only operators can submit readings"));
    }
    Room::intersection(&body.intersection_id)?;

    let reading = body.into_reading(IdKind::Reading.generate());
    state.store.insert_reading(reading.clone()).await?;

    let reached = state.hub.dispatcher.broadcast_traffic_update(&reading);
    tracing::info!(
        reading_id = %reading.id,
        intersection_id = %reading.intersection_id,
        user_id = %user.id,
        reached,
        "traffic reading stored"
    );

    Ok((StatusCode::CREATED, Json(reading)))
}
