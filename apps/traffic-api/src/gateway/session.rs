//! Per-connection gateway session state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use traffic_common::IdKind;

use crate::models::user::Identity;

use super::events::ServerEvent;

/// Capacity of each session's outbound queue. Events pushed while the queue
/// is full are dropped for that session only.
pub const OUTBOUND_CAPACITY: usize = 256;

pub type OutboundSender = mpsc::Sender<Arc<ServerEvent>>;
pub type OutboundReceiver = mpsc::Receiver<Arc<ServerEvent>>;

/// Create the queue that carries events from the dispatcher to one connection.
pub fn outbound_channel() -> (OutboundSender, OutboundReceiver) {
    mpsc::channel(OUTBOUND_CAPACITY)
}

/// State for a single WebSocket connection. The identity is fixed for the
/// lifetime of the session.
#[derive(Debug)]
pub struct Session {
    /// Unique session identifier (`ws_` prefixed ULID).
    pub session_id: String,
    pub identity: Identity,
    pub connected_at: DateTime<Utc>,
}

impl Session {
    pub fn new(identity: Identity) -> Self {
        Self {
            session_id: IdKind::Session.generate(),
            identity,
            connected_at: Utc::now(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.identity.id
    }
}
