//! System-wide alerts.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use traffic_common::IdKind;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody};
use crate::models::alert::SystemAlert;
use crate::models::incident::Severity;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/alerts", post(create_alert))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    pub alert_type: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertDispatched {
    pub alert: SystemAlert,
    /// Sessions the alert was queued for.
    pub recipients: usize,
}

// ---------------------------------------------------------------------------
// POST /api/v1/alerts
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/alerts",
    tag = "Alerts",
    security(("bearer" = [])),
    request_body = CreateAlertRequest,
    responses(
        (status = 202, description = "Alert pushed to every session", body = AlertDispatched),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
    ),
)]
pub async fn create_alert(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateAlertRequest>,
) -> Result<(StatusCode, Json<AlertDispatched>), ApiError> {
    if !user.role.is_admin() {
        return Err(ApiError::forbidden("Only administrators can send system alerts"));
    }
    if body.message.trim().is_empty() {
        return Err(ApiError::bad_request("Alert message is required"));
    }

    let alert = SystemAlert {
        id: IdKind::Alert.generate(),
        alert_type: body.alert_type,
        message: body.message,
        severity: body.severity,
        timestamp: Utc::now(),
    };
    let recipients = state.hub.dispatcher.broadcast_system_alert(&alert);

    Ok((StatusCode::ACCEPTED, Json(AlertDispatched { alert, recipients })))
}
