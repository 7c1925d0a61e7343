//! WebSocket upgrade handler and per-connection event loop.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::auth::middleware::bearer_token;
use crate::error::ApiError;
use crate::AppState;

use super::events::{parse_client_event, ServerEvent};
use super::handler::handle_client_event;
use super::lifecycle;
use super::session::{OutboundReceiver, Session};

/// Close codes (4000-range for application-level).
const CLOSE_INTERNAL_ERROR: u16 = 4000;
const CLOSE_SESSION_TIMEOUT: u16 = 4009;

type WsSink = SplitSink<WebSocket, Message>;

#[derive(Debug, Deserialize)]
pub struct HandshakeQuery {
    pub token: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

/// Authenticates before upgrading: a bad or missing token gets a plain HTTP
/// error response and no session is ever created.
async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HandshakeQuery>,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers).or(query.token.as_deref());
    let identity = lifecycle::authenticate(state.identity.as_ref(), token)
        .await
        .map_err(|err| {
            tracing::debug!(error = %err, "gateway handshake rejected");
            ApiError::from(err)
        })?;

    Ok(ws.on_upgrade(move |socket| async move {
        let heartbeat = state.config.heartbeat_interval;
        let (session, outbound) = lifecycle::establish(&state.hub, identity, heartbeat);
        run_session(&state, session.clone(), socket, outbound, heartbeat).await;
        lifecycle::teardown(&state.hub, &session.session_id);
    }))
}

/// Main session event loop: read client events, drain the outbound queue,
/// enforce heartbeat. Returns when the connection should be torn down.
async fn run_session(
    state: &AppState,
    session: Arc<Session>,
    socket: WebSocket,
    mut outbound: OutboundReceiver,
    heartbeat: Duration,
) {
    let (mut ws_tx, mut ws_rx): (WsSink, SplitStream<WebSocket>) = socket.split();

    // Any inbound frame counts as liveness; silence for 1.5x the interval closes.
    let deadline = heartbeat * 3 / 2;
    let mut last_seen = Instant::now();
    let mut heartbeat_timer = time::interval(heartbeat);
    heartbeat_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    heartbeat_timer.tick().await; // First tick fires immediately; skip it.

    loop {
        tokio::select! {
            // Client sends us a frame.
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        last_seen = Instant::now();
                        match parse_client_event(text.as_str()) {
                            Ok(event) => {
                                handle_client_event(&state.hub, state.store.as_ref(), &session, event).await;
                            }
                            Err(err) => {
                                tracing::debug!(session_id = %session.session_id, error = %err, "malformed client event");
                                state
                                    .hub
                                    .dispatcher
                                    .send_to(&session.session_id, ServerEvent::error(&err, None));
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => last_seen = Instant::now(),
                    Some(Err(e)) => {
                        tracing::debug!(?e, session_id = %session.session_id, "ws read error");
                        break;
                    }
                }
            }

            // Events queued for this session by the dispatcher or the handler.
            queued = outbound.recv() => {
                let Some(event) = queued else { break };
                let json = match serde_json::to_string(event.as_ref()) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(?e, event = %event.event, "failed to serialize server event");
                        let _ = send_close(&mut ws_tx, CLOSE_INTERNAL_ERROR, "Internal error").await;
                        break;
                    }
                };
                if ws_tx.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }

            _ = heartbeat_timer.tick() => {
                if ws_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }

            _ = time::sleep_until(last_seen + deadline) => {
                tracing::debug!(
                    session_id = %session.session_id,
                    "heartbeat timeout, closing connection"
                );
                let _ = send_close(&mut ws_tx, CLOSE_SESSION_TIMEOUT, "Heartbeat timeout").await;
                break;
            }
        }
    }
}

/// Send a WebSocket close frame with a code and reason.
async fn send_close(ws_tx: &mut WsSink, code: u16, reason: &str) -> Result<(), axum::Error> {
    let close_msg = Message::Close(Some(CloseFrame {
        code,
        reason: reason.to_string().into(),
    }));
    ws_tx.send(close_msg).await
}
