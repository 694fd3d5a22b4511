//! Tick callback that publishes each completed tick to the server.
//!
//! After each tick this replaces the REST snapshot and broadcasts one
//! encoded `UPDATE` frame to every connected `WebSocket` client.

use std::sync::Arc;

use hexclash_core::runner::TickCallback;
use hexclash_core::tick::TickSummary;
use hexclash_server::AppState;
use hexclash_types::WorldState;
use tracing::debug;

/// Callback that bridges the tick loop to the server state.
pub struct ServerCallback {
    state: Arc<AppState>,
}

impl ServerCallback {
    /// Create a new callback backed by the given app state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl TickCallback for ServerCallback {
    fn on_tick(&mut self, summary: &TickSummary, world: &WorldState) {
        let receivers = self.state.publish(world);
        debug!(tick = summary.tick, receivers, "Update broadcast sent");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use hexclash_core::commands::CommandQueue;
    use hexclash_types::Bounds;

    use super::*;

    #[tokio::test]
    async fn every_tick_reaches_subscribers_and_snapshot() {
        let state = Arc::new(AppState::new(
            WorldState::new(Bounds::default()),
            Arc::new(CommandQueue::new()),
        ));
        let mut rx = state.subscribe();
        let mut callback = ServerCallback::new(Arc::clone(&state));

        let mut world = WorldState::new(Bounds::default());
        world.tick = 12;
        let summary = TickSummary {
            tick: 12,
            ..TickSummary::default()
        };
        callback.on_tick(&summary, &world);

        let frame = rx.recv().await.unwrap();
        let json: serde_json::Value = serde_json::from_str(frame.as_str()).unwrap();
        assert_eq!(json["type"], "UPDATE");
        assert_eq!(json["state"]["tick"], 12);
        assert_eq!(state.snapshot.read().await.tick, 12);
    }
}
