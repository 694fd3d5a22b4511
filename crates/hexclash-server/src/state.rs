//! Shared application state for the Hexclash server.
//!
//! [`AppState`] holds the broadcast channel for encoded `UPDATE` frames,
//! the latest [`WorldState`] snapshot served by the REST endpoints, and the
//! handles connection tasks use to reach the tick loop: the
//! [`CommandQueue`] and the [`SessionRegistry`]. Connection tasks never see
//! the live world; they only read the snapshot and push commands.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Utf8Bytes;
use hexclash_core::commands::CommandQueue;
use hexclash_core::operator::OperatorState;
use hexclash_core::sessions::SessionRegistry;
use hexclash_types::{ServerMessage, WorldState};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, warn};

/// Capacity of the broadcast channel for update frames.
///
/// A subscriber that falls behind by more than this many frames receives a
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest one.
const BROADCAST_CAPACITY: usize = 16;

/// Default time a new connection has to send its `HELLO`.
const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
pub struct AppState {
    /// Broadcast sender for encoded `UPDATE` frames.
    pub tx: broadcast::Sender<Utf8Bytes>,
    /// The world as of the last completed tick.
    pub snapshot: RwLock<WorldState>,
    /// Queue of control commands for the tick loop.
    pub commands: Arc<CommandQueue>,
    /// Live connection registry.
    pub sessions: SessionRegistry,
    /// Shared operator control state (present when the simulation is running).
    pub operator_state: Option<Arc<OperatorState>>,
    /// Time a new connection has to complete the handshake.
    pub handshake_timeout: Duration,
}

impl AppState {
    /// Create a new application state around an initial snapshot.
    pub fn new(initial: WorldState, commands: Arc<CommandQueue>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            snapshot: RwLock::new(initial),
            commands,
            sessions: SessionRegistry::new(),
            operator_state: None,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Attach operator control state.
    #[must_use]
    pub fn with_operator(mut self, operator: Arc<OperatorState>) -> Self {
        self.operator_state = Some(operator);
        self
    }

    /// Override the handshake timeout.
    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Subscribe to the update broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<Utf8Bytes> {
        self.tx.subscribe()
    }

    /// Publish a completed tick: encode the `UPDATE` frame once, send it to
    /// every subscriber, and replace the REST snapshot.
    ///
    /// Returns the number of receivers that got the frame. Zero is normal
    /// when no clients are connected.
    pub fn publish(&self, state: &WorldState) -> usize {
        let receivers = encode_update(state).map_or_else(
            |e| {
                warn!(tick = state.tick, error = %e, "Failed to encode update frame");
                0
            },
            |frame| self.tx.send(frame).unwrap_or(0),
        );

        // Never block the tick loop on a REST reader; the next tick catches up.
        let Ok(mut snap) = self.snapshot.try_write() else {
            debug!(tick = state.tick, "Snapshot busy, skipping update");
            return receivers;
        };
        snap.clone_from(state);

        receivers
    }

    /// Store the world the run ended on, waiting for any REST reader to
    /// finish. A tick whose snapshot update was skipped by [`Self::publish`]
    /// is not left stale once the loop has exited.
    pub async fn store_final(&self, state: &WorldState) {
        self.snapshot.write().await.clone_from(state);
        debug!(tick = state.tick, "Final snapshot stored");
    }
}

/// Encode a world as an `UPDATE` text frame.
///
/// # Errors
///
/// Returns the serializer error if the world cannot be encoded.
pub fn encode_update(state: &WorldState) -> Result<Utf8Bytes, serde_json::Error> {
    let message = ServerMessage::Update {
        state: state.clone(),
    };
    serde_json::to_string(&message).map(Utf8Bytes::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hexclash_types::{Agent, AgentId, Bounds, Mode, Position};

    use super::*;

    fn world() -> WorldState {
        let mut world = WorldState::new(Bounds::new(-2, 2, -2, 2));
        world.insert_agent(Agent::new(AgentId::from("a"), Position::new(1, -1), Mode::Flee));
        world.tick = 7;
        world
    }

    #[tokio::test]
    async fn publish_sends_one_shared_frame_and_updates_snapshot() {
        let state = AppState::new(WorldState::new(Bounds::default()), Arc::new(CommandQueue::new()));
        let mut first = state.subscribe();
        let mut second = state.subscribe();

        assert_eq!(state.publish(&world()), 2);

        let a = first.recv().await.unwrap();
        let b = second.recv().await.unwrap();
        assert_eq!(a.as_str(), b.as_str());

        let json: serde_json::Value = serde_json::from_str(a.as_str()).unwrap();
        assert_eq!(json["type"], "UPDATE");
        assert_eq!(json["state"]["tick"], 7);
        assert_eq!(json["state"]["players"]["a"]["mode"], "FLEE");

        assert_eq!(state.snapshot.read().await.tick, 7);
    }

    #[tokio::test]
    async fn publish_without_clients_still_updates_snapshot() {
        let state = AppState::new(WorldState::new(Bounds::default()), Arc::new(CommandQueue::new()));
        assert_eq!(state.publish(&world()), 0);
        assert_eq!(state.snapshot.read().await.agents.len(), 1);
    }

    #[tokio::test]
    async fn store_final_replaces_a_snapshot_skipped_while_busy() {
        let state = AppState::new(WorldState::new(Bounds::default()), Arc::new(CommandQueue::new()));
        {
            let reader = state.snapshot.read().await;
            state.publish(&world());
            assert_eq!(reader.tick, 0);
        }
        assert_eq!(state.snapshot.read().await.tick, 0);

        state.store_final(&world()).await;
        assert_eq!(state.snapshot.read().await.tick, 7);
    }
}
