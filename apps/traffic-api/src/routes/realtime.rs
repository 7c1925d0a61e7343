//! Read-only view of the gateway's live state.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::ApiErrorBody;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/realtime/stats", get(stats))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeStats {
    pub connected_sessions: usize,
    pub uptime_seconds: u64,
    /// Member count per non-empty room.
    pub rooms: BTreeMap<String, usize>,
}

// ---------------------------------------------------------------------------
// GET /api/v1/realtime/stats
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/realtime/stats",
    tag = "Realtime",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Connected sessions and room sizes", body = RealtimeStats),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
        (status = 403, description = "Account inactive", body = ApiErrorBody),
    ),
)]
pub async fn stats(_user: AuthUser, State(state): State<AppState>) -> Json<RealtimeStats> {
    let hub = &state.hub;
    Json(RealtimeStats {
        connected_sessions: hub.dispatcher.connected_session_count(),
        uptime_seconds: hub.uptime().as_secs(),
        rooms: hub.registry().room_sizes(),
    })
}
