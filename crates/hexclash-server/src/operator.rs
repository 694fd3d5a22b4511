//! Operator REST API handlers for runtime simulation control.
//!
//! These endpoints are separate from the read-only world API and from the
//! player `WebSocket`. They give the operator one-way command authority
//! over the tick loop.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/operator/status` | Current simulation status |
//! | `POST` | `/api/operator/pause` | Pause the tick loop |
//! | `POST` | `/api/operator/resume` | Resume the tick loop |
//! | `POST` | `/api/operator/speed` | Set tick interval (ms) |
//! | `POST` | `/api/operator/stop` | Trigger clean shutdown |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use hexclash_core::config::MIN_TICK_INTERVAL_MS;
use hexclash_core::operator::{OperatorState, SimulationStatus};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/operator/speed`.
#[derive(Debug, serde::Deserialize)]
pub struct SetSpeedRequest {
    /// New tick interval in milliseconds (minimum 100).
    pub tick_interval_ms: u64,
}

/// Generic success response.
#[derive(Debug, serde::Serialize)]
struct OperatorResponse {
    ok: bool,
    message: String,
}

impl OperatorResponse {
    fn ok(message: &str) -> Json<Self> {
        Json(Self {
            ok: true,
            message: message.to_owned(),
        })
    }
}

fn operator(state: &AppState) -> Result<&Arc<OperatorState>, ApiError> {
    state
        .operator_state
        .as_ref()
        .ok_or_else(|| ApiError::Internal("operator state not available".to_owned()))
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// POST /api/operator/pause
// ---------------------------------------------------------------------------

/// Pause the simulation tick loop. The world and all connections are kept.
pub async fn pause(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    operator(&state)?.pause();
    info!("Operator paused the simulation");
    Ok(OperatorResponse::ok("Simulation paused"))
}

// ---------------------------------------------------------------------------
// POST /api/operator/resume
// ---------------------------------------------------------------------------

/// Resume the simulation tick loop after a pause.
pub async fn resume(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    operator(&state)?.resume();
    info!("Operator resumed the simulation");
    Ok(OperatorResponse::ok("Simulation resumed"))
}

// ---------------------------------------------------------------------------
// POST /api/operator/speed
// ---------------------------------------------------------------------------

/// Change the tick interval at runtime.
///
/// The new interval takes effect before the next tick.
pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetSpeedRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let prev = operator(&state)?
        .set_tick_interval_ms(body.tick_interval_ms)
        .ok_or_else(|| {
            ApiError::InvalidRequest(format!(
                "tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}"
            ))
        })?;

    info!(from = prev, to = body.tick_interval_ms, "Operator changed tick interval");

    Ok(Json(serde_json::json!({
        "ok": true,
        "message": format!("Tick interval changed from {prev}ms to {}ms", body.tick_interval_ms),
        "previous_interval_ms": prev,
        "new_interval_ms": body.tick_interval_ms,
    })))
}

// ---------------------------------------------------------------------------
// POST /api/operator/stop
// ---------------------------------------------------------------------------

/// Request a clean stop. The tick loop exits before its next tick and the
/// engine shuts down.
pub async fn stop(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    operator(&state)?.request_stop();
    info!("Operator requested stop");
    Ok(OperatorResponse::ok("Stop requested"))
}

// ---------------------------------------------------------------------------
// GET /api/operator/status
// ---------------------------------------------------------------------------

/// Return the current simulation status.
pub async fn status(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let operator = operator(&state)?;

    let (tick, agents, chests) = {
        let snapshot = state.snapshot.read().await;
        (snapshot.tick, snapshot.agents.len(), snapshot.chests.len())
    };
    let connected = state.sessions.connected_count().await;

    Ok(Json(SimulationStatus {
        tick,
        paused: operator.is_paused(),
        stop_requested: operator.is_stop_requested(),
        tick_interval_ms: operator.tick_interval_ms(),
        elapsed_seconds: operator.elapsed_seconds(),
        max_ticks: operator.max_ticks(),
        max_real_time_seconds: operator.max_real_time_seconds(),
        agents: count(agents),
        chests: count(chests),
        connected: count(connected),
        end_reason: operator.end_reason().await,
        started_at: operator.started_at().to_rfc3339(),
    }))
}
