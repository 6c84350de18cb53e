//! Progress socket
//!
//! `GET /ws?submissionId=<id>[&lastSequence=<n>]` upgrades to a WebSocket
//! that streams one submission's progress events: buffered history first,
//! then live events, ending after the terminal event. A reconnecting client
//! passes the last sequence it received and the replay resumes right after
//! it.
//!
//! Server messages:
//! - `{"type":"connected","submissionId":..,"timestamp":..,"reconnect":{..}}` on attach
//! - every [`ProgressEvent`] as published (`type` = progress / complete / incomplete / error)
//! - `{"type":"pong","timestamp":..}` in answer to a client `{"type":"ping"}`
//!
//! The server pings every heartbeat interval and drops a connection that did
//! not answer the previous ping. Dropping the socket never affects the
//! pipeline.

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use rights_common::events::{now_millis, ProgressEvent};
use rights_common::reconnect::ReconnectPolicy;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::workflow::ProgressSubscription;
use crate::AppState;

/// Policy violation: missing or unusable submission id
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;
const CLOSE_NORMAL: u16 = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsParams {
    pub submission_id: Option<String>,
    /// Last sequence the client already holds
    pub last_sequence: Option<u64>,
}

/// Backoff hint sent to clients on attach
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectHint {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub cap_ms: u64,
}

impl From<ReconnectPolicy> for ReconnectHint {
    fn from(policy: ReconnectPolicy) -> Self {
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            multiplier: policy.multiplier,
            cap_ms: policy.cap.as_millis() as u64,
        }
    }
}

/// Control messages the server sends besides progress events
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Connected {
        submission_id: Uuid,
        timestamp: i64,
        reconnect: ReconnectHint,
    },
    Pong {
        timestamp: i64,
    },
}

/// Messages a client may send
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Ping,
    Pong,
    #[serde(other)]
    Unknown,
}

/// What the connection should do on a heartbeat tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatAction {
    SendPing,
    Terminate,
}

/// Liveness tracking, independent of the transport
///
/// Each tick sends a ping; a tick that finds the previous ping unanswered
/// terminates the connection.
#[derive(Debug, Default)]
pub struct Heartbeat {
    awaiting_pong: bool,
}

impl Heartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_tick(&mut self) -> HeartbeatAction {
        if self.awaiting_pong {
            HeartbeatAction::Terminate
        } else {
            self.awaiting_pong = true;
            HeartbeatAction::SendPing
        }
    }

    /// Any sign of life from the client
    pub fn on_pong(&mut self) {
        self.awaiting_pong = false;
    }
}

/// GET /ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> Response {
    let submission_id = params
        .submission_id
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw).ok());
    let resume_after = params.last_sequence;
    let heartbeat = state.config.heartbeat_interval();

    ws.on_upgrade(move |socket| async move {
        match submission_id {
            Some(id) => match state.channel.open(id, resume_after) {
                Ok(subscription) => stream_progress(socket, subscription, heartbeat).await,
                Err(e) => {
                    warn!(submission_id = %id, error = %e, "Progress subscription refused");
                    close_with(socket, CLOSE_POLICY_VIOLATION, e.to_string()).await;
                }
            },
            None => {
                debug!("Progress socket opened without a valid submissionId");
                close_with(
                    socket,
                    CLOSE_POLICY_VIOLATION,
                    "submissionId query parameter required".to_string(),
                )
                .await;
            }
        }
    })
}

async fn close_with(mut socket: WebSocket, code: u16, reason: String) {
    send_close(&mut socket, code, Cow::Owned(reason)).await;
}

/// Send a close frame; a peer that already went away is logged, not an error
async fn send_close<S>(sender: &mut S, code: u16, reason: Cow<'static, str>) -> bool
where
    S: futures::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    match sender.send(Message::Close(Some(CloseFrame { code, reason }))).await {
        Ok(()) => true,
        Err(e) => {
            debug!(code, error = %e, "Close frame not delivered");
            false
        }
    }
}

fn to_text<T: Serialize>(value: &T) -> Option<Message> {
    match serde_json::to_string(value) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            warn!(error = %e, "Could not serialize socket message");
            None
        }
    }
}

async fn stream_progress(
    socket: WebSocket,
    mut subscription: ProgressSubscription,
    heartbeat_interval: Duration,
) {
    let submission_id = subscription.submission_id();
    let (mut sender, mut receiver) = socket.split();

    let connected = ServerMessage::Connected {
        submission_id,
        timestamp: now_millis(),
        reconnect: ReconnectPolicy::default().into(),
    };
    if let Some(msg) = to_text(&connected) {
        if sender.send(msg).await.is_err() {
            return;
        }
    }
    info!(submission_id = %submission_id, "Progress subscriber connected");

    let mut heartbeat = Heartbeat::new();
    let mut ticker =
        tokio::time::interval_at(tokio::time::Instant::now() + heartbeat_interval, heartbeat_interval);

    loop {
        tokio::select! {
            event = subscription.next() => {
                let Some(event) = event else {
                    send_close(&mut sender, CLOSE_NORMAL, Cow::Borrowed("submission finished")).await;
                    break;
                };
                if !forward_event(&mut sender, &event).await {
                    break;
                }
            }
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        heartbeat.on_pong();
                        if let Ok(ClientMessage::Ping) = serde_json::from_str::<ClientMessage>(&text) {
                            let pong = ServerMessage::Pong { timestamp: now_millis() };
                            if let Some(msg) = to_text(&pong) {
                                if sender.send(msg).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Ping(_))) => heartbeat.on_pong(),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Binary(_))) => {}
                    Some(Err(e)) => {
                        debug!(submission_id = %submission_id, error = %e, "Socket receive error");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                match heartbeat.on_tick() {
                    HeartbeatAction::SendPing => {
                        if sender.send(Message::Ping(Vec::new())).await.is_err() {
                            break;
                        }
                    }
                    HeartbeatAction::Terminate => {
                        info!(submission_id = %submission_id, "Progress subscriber unresponsive, dropping");
                        break;
                    }
                }
            }
        }
    }

    debug!(submission_id = %submission_id, "Progress subscriber detached");
}

async fn forward_event<S>(sender: &mut S, event: &ProgressEvent) -> bool
where
    S: futures::Sink<Message> + Unpin,
{
    match to_text(event) {
        Some(msg) => sender.send(msg).await.is_ok(),
        None => true,
    }
}

/// Build progress socket routes
pub fn ws_routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}
