//! Connection lifecycle: authenticate, establish, tear down.
//!
//! `Connecting → Authenticated → Active → Disconnected`. A failed
//! authentication never creates a [`Session`]; establishing one registers it
//! and joins its default rooms in the same step.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::auth::identity::IdentityResolver;
use crate::error::GatewayError;
use crate::models::user::Identity;

use super::events::{EventName, ServerEvent};
use super::hub::RealtimeHub;
use super::session::{outbound_channel, OutboundReceiver, Session};

/// Resolve the bearer credential presented at handshake time.
pub async fn authenticate(
    resolver: &dyn IdentityResolver,
    token: Option<&str>,
) -> Result<Identity, GatewayError> {
    let token = token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| GatewayError::Unauthenticated("Missing bearer token".to_string()))?;
    resolver.resolve(token).await
}

/// Register a session for an authenticated identity, join its default rooms,
/// and queue the `connected` welcome. Returns the session and the receiving
/// end of its outbound queue.
pub fn establish(
    hub: &RealtimeHub,
    identity: Identity,
    heartbeat_interval: Duration,
) -> (Arc<Session>, OutboundReceiver) {
    let session = Arc::new(Session::new(identity));
    let (tx, rx) = outbound_channel();
    hub.registry().register(session.clone(), tx);

    let rooms = hub
        .router
        .assign_default_rooms(&session.session_id, &session.identity);

    tracing::info!(
        session_id = %session.session_id,
        user_id = %session.user_id(),
        role = session.identity.role.as_str(),
        rooms = rooms.len(),
        "gateway session established"
    );

    let welcome = json!({
        "sessionId": session.session_id,
        "user": session.identity,
        "rooms": rooms,
        "connectedAt": session.connected_at,
        "heartbeatInterval": heartbeat_interval.as_millis() as u64,
    });
    hub.dispatcher
        .send_to(&session.session_id, ServerEvent::new(EventName::CONNECTED, welcome));

    (session, rx)
}

/// Remove the session from every room and from the registry. Safe to call
/// more than once; returns whether this call did the removal.
pub fn teardown(hub: &RealtimeHub, session_id: &str) -> bool {
    match hub.registry().remove(session_id) {
        Some(removed) => {
            tracing::info!(
                %session_id,
                user_id = %removed.session.user_id(),
                rooms = removed.rooms.len(),
                "gateway session ended"
            );
            true
        }
        None => {
            tracing::debug!(%session_id, "session already torn down");
            false
        }
    }
}
