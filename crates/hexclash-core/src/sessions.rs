//! Live connection tracking and the identity handshake.
//!
//! The registry maps each identity to the token of its newest live
//! connection. It never owns or removes agents: a dropped connection only
//! clears the live entry, and a later handshake presenting the same
//! identity finds the agent still in the world.
//!
//! A client that reconnects before its old socket has noticed the drop gets
//! a new token. The stale socket's eventual detach carries the old token and
//! is ignored.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use hexclash_types::AgentId;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// One accepted handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Identity the connection acts for.
    pub agent_id: AgentId,
    /// Connection token, unique per attach.
    pub token: u64,
    /// Whether this identity was issued or seen earlier in this process.
    pub resumed: bool,
}

#[derive(Debug, Default)]
struct Table {
    live: BTreeMap<AgentId, u64>,
    known: BTreeSet<AgentId>,
}

/// Registry of live connections keyed by identity.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    table: Mutex<Table>,
    next_token: AtomicU64,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a handshake.
    ///
    /// A well-formed presented identity is adopted as is. A missing or
    /// malformed one is replaced with a freshly minted identity, which the
    /// caller must send back to the client.
    pub async fn attach(&self, presented: Option<&str>) -> Session {
        let agent_id = presented
            .and_then(AgentId::parse)
            .unwrap_or_else(AgentId::mint);
        let token = self.next_token.fetch_add(1, Ordering::AcqRel);

        let mut table = self.table.lock().await;
        let resumed = !table.known.insert(agent_id.clone());
        let superseded = table.live.insert(agent_id.clone(), token).is_some();

        info!(
            agent_id = %agent_id,
            token,
            resumed,
            superseded,
            connected = table.live.len(),
            "Session attached"
        );

        Session {
            agent_id,
            token,
            resumed,
        }
    }

    /// Drop a connection. Returns `true` if it was the identity's live
    /// connection; a superseded session's detach is a no-op.
    pub async fn detach(&self, session: &Session) -> bool {
        let mut table = self.table.lock().await;
        if table.live.get(&session.agent_id) != Some(&session.token) {
            debug!(agent_id = %session.agent_id, token = session.token, "Stale session detach ignored");
            return false;
        }
        table.live.remove(&session.agent_id);
        info!(
            agent_id = %session.agent_id,
            token = session.token,
            connected = table.live.len(),
            "Session detached"
        );
        true
    }

    /// Number of identities with a live connection.
    pub async fn connected_count(&self) -> usize {
        self.table.lock().await.live.len()
    }

    /// Whether `agent_id` has a live connection.
    pub async fn is_connected(&self, agent_id: &AgentId) -> bool {
        self.table.lock().await.live.contains_key(agent_id)
    }
}
