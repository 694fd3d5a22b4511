//! Simulation loop runner with operator controls.
//!
//! This module provides [`run_simulation`], the top-level async function
//! that drives the tick loop with support for:
//!
//! - **Bounded simulation**: stop after `max_ticks` or `max_real_time_seconds`
//! - **Pause/resume**: operator can halt and continue the tick loop
//! - **Variable tick speed**: tick interval adjustable at runtime
//! - **Operator stop**: clean stop via REST API or `Ctrl-C`
//!
//! Ticks never overlap. The loop waits on a [`tokio::time::Interval`] with
//! [`MissedTickBehavior::Skip`]: a tick that runs longer than the interval
//! causes the missed slots to be dropped rather than replayed as a burst.
//! Each such overrun is counted and logged.

use std::sync::Arc;
use std::time::Duration;

use hexclash_types::WorldState;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::commands::CommandQueue;
use crate::operator::{OperatorState, SimulationEndReason};
use crate::tick::{self, TickContext, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Result of the simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// Ticks whose work outlasted the tick interval.
    pub overruns: u64,
    /// The world as of the last completed tick.
    pub final_state: WorldState,
}

/// Callback invoked after each tick completes.
///
/// Implementations publish the new world to observers: the server snapshot,
/// the `WebSocket` broadcast, test probes.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &WorldState);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &WorldState) {}
}

/// Build the pacing timer for `interval_ms`. Zero means unpaced.
fn make_ticker(interval_ms: u64) -> Option<Interval> {
    (interval_ms > 0).then(|| {
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    })
}

/// Run the simulation loop until a termination condition is met.
///
/// # Arguments
///
/// * `state` - The world to start from; owned by the loop until it returns
/// * `commands` - Queue drained once per tick
/// * `ctx` - Spawn configuration and RNG
/// * `operator` - Shared operator control state
/// * `callback` - Called after each tick with the new world
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably.
pub async fn run_simulation(
    mut state: WorldState,
    commands: &CommandQueue,
    ctx: &mut TickContext,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;
    let mut overruns: u64 = 0;
    let mut interval_ms = operator.tick_interval_ms();
    let mut ticker = make_ticker(interval_ms);

    info!(
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = interval_ms,
        start_tick = state.tick,
        "Simulation starting"
    );

    let end_reason = loop {
        // --- Check pause ---
        if operator.is_paused() {
            info!("Simulation paused, waiting for resume...");
            operator.wait_if_paused().await;
            info!("Simulation resumed");
        }

        // --- Check stop request (before tick) ---
        if operator.is_stop_requested() {
            info!("Operator stop requested");
            break SimulationEndReason::OperatorStop;
        }

        // --- Check time limit (before tick) ---
        if operator.time_limit_reached() {
            info!(
                max_seconds = operator.max_real_time_seconds(),
                elapsed = operator.elapsed_seconds(),
                "Real-time limit reached"
            );
            break SimulationEndReason::MaxRealTimeReached;
        }

        // --- Pace ---
        let requested_ms = operator.tick_interval_ms();
        if requested_ms != interval_ms {
            info!(from = interval_ms, to = requested_ms, "Tick interval changed");
            interval_ms = requested_ms;
            ticker = make_ticker(interval_ms);
        }
        if let Some(ticker) = ticker.as_mut() {
            ticker.tick().await;
        }

        // --- Execute tick ---
        let started = Instant::now();
        let drained = commands.drain().await;
        let (next, summary) = tick::run_tick(state, drained, ctx)?;
        state = next;
        total_ticks = total_ticks.saturating_add(1);

        // --- Notify callback ---
        callback.on_tick(&summary, &state);

        let elapsed = started.elapsed();
        if interval_ms > 0 && elapsed > Duration::from_millis(interval_ms) {
            overruns = overruns.saturating_add(1);
            warn!(
                tick = summary.tick,
                elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                interval_ms,
                "Tick overran its interval; skipping missed slots"
            );
        }

        last_summary = Some(summary);

        // --- Check tick limit (after tick) ---
        if operator.tick_limit_reached(total_ticks) {
            info!(
                tick = summary.tick,
                max_ticks = operator.max_ticks(),
                "Tick limit reached"
            );
            break SimulationEndReason::MaxTicksReached;
        }
    };

    operator.set_end_reason(end_reason).await;

    Ok(SimulationResult {
        end_reason,
        final_summary: last_summary,
        total_ticks,
        overruns,
        final_state: state,
    })
}

/// Log the simulation end sequence.
///
/// Called after [`run_simulation`] returns. The HTTP server keeps serving
/// the final snapshot after this.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        overruns = result.overruns,
        final_tick = result.final_state.tick,
        agents = result.final_state.agents.len(),
        "Simulation ended"
    );

    if result.final_summary.is_none() {
        warn!("Simulation ended with no ticks executed");
    }
}
