//! REST API endpoint handlers.
//!
//! All handlers read from the latest [`WorldState`] snapshot held in the
//! shared [`AppState`]. They never touch the live world owned by the tick
//! loop.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/world` | Latest world snapshot |
//! | `GET` | `/api/agents` | List agents (optionally by mode) |
//! | `GET` | `/api/agents/{id}` | Single agent |
//!
//! [`WorldState`]: hexclash_types::WorldState

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use hexclash_types::{Agent, AgentId, Mode, WorldState};

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/agents` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct AgentsQuery {
    /// Only return agents in this mode.
    pub mode: Option<Mode>,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing server status and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (tick, agent_count, chest_count) = {
        let snapshot = state.snapshot.read().await;
        (snapshot.tick, snapshot.agents.len(), snapshot.chests.len())
    };
    let connected = state.sessions.connected_count().await;

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Hexclash</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
    </style>
</head>
<body>
    <h1>Hexclash</h1>
    <div>
        <div class="metric"><div class="label">Tick</div><div class="value">{tick}</div></div>
        <div class="metric"><div class="label">Agents</div><div class="value">{agent_count}</div></div>
        <div class="metric"><div class="label">Chests</div><div class="value">{chest_count}</div></div>
        <div class="metric"><div class="label">Connected</div><div class="value">{connected}</div></div>
    </div>
    <ul>
        <li><a href="/api/world">/api/world</a></li>
        <li><a href="/api/agents">/api/agents</a></li>
        <li><a href="/api/operator/status">/api/operator/status</a></li>
        <li>/ws (WebSocket)</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/world
// ---------------------------------------------------------------------------

/// Return the latest world snapshot, in the same shape as the `UPDATE`
/// frame's `state`.
pub async fn get_world(State(state): State<Arc<AppState>>) -> Json<WorldState> {
    Json(state.snapshot.read().await.clone())
}

// ---------------------------------------------------------------------------
// GET /api/agents
// ---------------------------------------------------------------------------

/// List agents in identity order.
pub async fn list_agents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AgentsQuery>,
) -> Json<Vec<Agent>> {
    let snapshot = state.snapshot.read().await;
    let agents = snapshot
        .agents
        .values()
        .filter(|a| query.mode.is_none_or(|mode| a.mode == mode))
        .cloned()
        .collect();
    Json(agents)
}

// ---------------------------------------------------------------------------
// GET /api/agents/{id}
// ---------------------------------------------------------------------------

/// Return a single agent.
pub async fn get_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Agent>, ApiError> {
    let snapshot = state.snapshot.read().await;
    snapshot
        .agents
        .get(&AgentId::from(id.as_str()))
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("agent {id} not found")))
}
