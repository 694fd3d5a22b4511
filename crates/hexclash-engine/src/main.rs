//! Engine binary for the Hexclash simulation.
//!
//! This is the main entry point that wires together the tick loop, the
//! HTTP + `WebSocket` server, and the operator controls. It loads
//! configuration, initializes all subsystems, and runs the simulation loop
//! until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `hexclash-config.yaml` (or defaults), apply
//!    `HEXCLASH_*` overrides, validate
//! 2. Initialize structured logging (tracing)
//! 3. Create the empty world at tick 0 and the tick context (seeded RNG)
//! 4. Create operator state from simulation bounds
//! 5. Start the server on a background task
//! 6. Run the simulation loop, publishing every tick to the server
//! 7. Log the result; keep serving the final snapshot until `Ctrl-C`
//!    unless the operator stopped the run

mod callback;
mod error;
mod logging;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use hexclash_core::commands::CommandQueue;
use hexclash_core::config::HexclashConfig;
use hexclash_core::operator::{OperatorState, SimulationEndReason};
use hexclash_core::runner;
use hexclash_core::tick::TickContext;
use hexclash_server::AppState;
use hexclash_types::WorldState;
use tracing::{info, warn};

use crate::callback::ServerCallback;
use crate::error::EngineError;

/// Config file looked up in the working directory.
const CONFIG_PATH: &str = "hexclash-config.yaml";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    logging::init(&config.logging)?;
    info!("hexclash-engine starting");
    info!(
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        bounds = ?config.world.bounds,
        host = config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );

    // 3. Create the world and tick context.
    let world = WorldState::new(config.world.bounds);
    let mut ctx = TickContext::from_config(&config);
    info!(tiles = config.world.bounds.tile_count(), "World created");

    // 4. Create operator state.
    let operator = Arc::new(OperatorState::new(
        config.world.tick_interval_ms,
        &config.simulation,
    ));
    info!(
        max_ticks = operator.max_ticks(),
        max_real_time_seconds = operator.max_real_time_seconds(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Operator state initialized"
    );

    // 5. Start the server.
    let commands = Arc::new(CommandQueue::new());
    let app_state = Arc::new(
        AppState::new(world.clone(), Arc::clone(&commands))
            .with_operator(Arc::clone(&operator))
            .with_handshake_timeout(Duration::from_millis(config.server.handshake_timeout_ms)),
    );
    let server = hexclash_server::spawn_server(&config.server, Arc::clone(&app_state)).await?;
    info!(addr = %server.addr, "Server started");

    // Ctrl-C requests a clean stop.
    {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, requesting stop");
                    operator.request_stop();
                }
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C"),
            }
        });
    }

    // 6. Run the simulation.
    let mut callback = ServerCallback::new(Arc::clone(&app_state));
    let result = runner::run_simulation(world, &commands, &mut ctx, &operator, &mut callback).await?;
    app_state.store_final(&result.final_state).await;

    // 7. Log results.
    runner::log_simulation_end(&result);

    if result.end_reason != SimulationEndReason::OperatorStop {
        info!("Serving final snapshot, press Ctrl-C to exit");
        tokio::signal::ctrl_c().await?;
    }

    server.task.abort();
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "hexclash-engine shutdown complete"
    );

    Ok(())
}

/// Load configuration from `hexclash-config.yaml` in the working directory,
/// falling back to defaults (still subject to environment overrides).
fn load_config() -> Result<HexclashConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        return Ok(HexclashConfig::from_file(config_path)?);
    }
    let mut config = HexclashConfig::default();
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}
