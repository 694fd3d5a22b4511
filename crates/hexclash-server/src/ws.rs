//! `WebSocket` handler: identity handshake, mode control, and update
//! streaming.
//!
//! Clients connect to `GET /ws`. The first frame must be a `HELLO` within
//! the handshake timeout; the server answers `WELCOME` with the identity
//! the client must persist and queues a join for the next tick. After
//! that the connection receives every `UPDATE` frame and may send
//! `SET_MODE`. Anything else is dropped and logged.
//!
//! A client that falls behind skips to the newest snapshot. Closing the
//! socket detaches the session; the agent stays in the world.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use hexclash_core::commands::Command;
use hexclash_core::sessions::Session;
use hexclash_types::{AgentId, ClientMessage, ServerMessage};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// What the session loop does with one inbound text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Queue this command for the next tick.
    Command(Command),
    /// A second `HELLO` on an established session; ignored.
    RepeatedHello,
    /// Not a valid control message; dropped.
    Malformed(String),
}

/// Interpret a text frame received after the handshake.
pub fn interpret(agent_id: &AgentId, text: &str) -> Inbound {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::SetMode { mode }) => Inbound::Command(Command::SetMode {
            agent_id: agent_id.clone(),
            mode,
        }),
        Ok(ClientMessage::Hello { .. }) => Inbound::RepeatedHello,
        Err(e) => Inbound::Malformed(e.to_string()),
    }
}

/// Upgrade an HTTP request to a `WebSocket` player connection.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_player(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the connection lifecycle: handshake, stream, detach.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    let handshake = tokio::time::timeout(state.handshake_timeout, await_hello(&mut socket)).await;
    let presented = match handshake {
        Ok(Some(presented)) => presented,
        Ok(None) => {
            debug!("WebSocket closed before a valid HELLO");
            return;
        }
        Err(_) => {
            warn!(timeout = ?state.handshake_timeout, "Handshake timed out, closing");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    let session = state.sessions.attach(presented.as_deref()).await;

    if !welcome(&mut socket, &session).await {
        state.sessions.detach(&session).await;
        return;
    }

    state
        .commands
        .push(Command::Join {
            agent_id: session.agent_id.clone(),
        })
        .await;

    stream(&mut socket, &state, &session).await;

    state.sessions.detach(&session).await;
}

/// Wait for the first application frame and require it to be a `HELLO`.
///
/// Returns the presented identity (possibly absent), or `None` if the
/// socket closed or the first frame was anything else.
async fn await_hello(socket: &mut WebSocket) -> Option<Option<String>> {
    loop {
        match socket.recv().await? {
            Ok(Message::Text(text)) => {
                return match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(ClientMessage::Hello { player_id }) => Some(player_id),
                    Ok(other) => {
                        warn!(message = ?other, "First frame was not HELLO, closing");
                        None
                    }
                    Err(e) => {
                        warn!(error = %e, "Malformed handshake frame, closing");
                        None
                    }
                };
            }
            Ok(Message::Ping(data)) => {
                socket.send(Message::Pong(data)).await.ok()?;
            }
            Ok(Message::Pong(_)) => {}
            Ok(Message::Binary(_)) => {
                warn!("Binary handshake frame, closing");
                return None;
            }
            Ok(Message::Close(_)) => return None,
            Err(e) => {
                debug!("WebSocket error during handshake: {e}");
                return None;
            }
        }
    }
}

/// Send the `WELCOME` frame. Returns `false` if the client is gone.
async fn welcome(socket: &mut WebSocket, session: &Session) -> bool {
    let message = ServerMessage::Welcome {
        id: session.agent_id.clone(),
    };
    let json = match serde_json::to_string(&message) {
        Ok(j) => j,
        Err(e) => {
            warn!(agent_id = %session.agent_id, "Failed to serialize WELCOME: {e}");
            return false;
        }
    };
    info!(agent_id = %session.agent_id, resumed = session.resumed, "Player welcomed");
    socket.send(Message::Text(json.into())).await.is_ok()
}

/// Forward update frames and accept control messages until the client
/// disconnects.
async fn stream(socket: &mut WebSocket, state: &AppState, session: &Session) {
    let agent_id = &session.agent_id;
    let mut rx = state.subscribe();

    loop {
        tokio::select! {
            // Receive an update frame from the tick loop.
            result = rx.recv() => {
                match result {
                    Ok(frame) => {
                        if socket.send(Message::Text(frame)).await.is_err() {
                            debug!(agent_id = %agent_id, "WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(agent_id = %agent_id, skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Broadcast channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            // Control messages and disconnects from the client.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match interpret(agent_id, text.as_str()) {
                        Inbound::Command(command) => state.commands.push(command).await,
                        Inbound::RepeatedHello => {
                            warn!(agent_id = %agent_id, "Repeated HELLO ignored");
                        }
                        Inbound::Malformed(error) => {
                            warn!(agent_id = %agent_id, %error, "Malformed message dropped");
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(agent_id = %agent_id, "WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(agent_id = %agent_id, "WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {
                        warn!(agent_id = %agent_id, "Binary message dropped");
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Err(e)) => {
                        debug!(agent_id = %agent_id, "WebSocket error: {e}");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use hexclash_types::Mode;

    use super::*;

    #[test]
    fn set_mode_becomes_a_command_for_the_session() {
        let id = AgentId::from("p1");
        assert_eq!(
            interpret(&id, r#"{"type":"SET_MODE","mode":"FLEE"}"#),
            Inbound::Command(Command::SetMode {
                agent_id: id.clone(),
                mode: Mode::Flee,
            })
        );
    }

    #[test]
    fn repeated_hello_is_ignored() {
        let id = AgentId::from("p1");
        assert_eq!(
            interpret(&id, r#"{"type":"HELLO","playerId":"other"}"#),
            Inbound::RepeatedHello
        );
    }

    #[test]
    fn junk_is_malformed() {
        let id = AgentId::from("p1");
        for raw in [
            r#"{"type":"SET_MODE","mode":"DANCE"}"#,
            r#"{"type":"MOVE","dq":1,"dr":0}"#,
            "{",
        ] {
            assert!(matches!(interpret(&id, raw), Inbound::Malformed(_)), "{raw}");
        }
    }
}
