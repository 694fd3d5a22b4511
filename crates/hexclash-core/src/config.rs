//! Configuration loading and typed config structures for the Hexclash
//! simulation.
//!
//! The canonical configuration lives in `hexclash-config.yaml` in the
//! working directory. Every field carries a serde default, so a missing
//! section (or an empty file) yields the values the browser client expects:
//! a 101 x 101 world, a 2 second tick, port 8080.

use std::path::Path;

use hexclash_types::{Bounds, Mode};
use hexclash_world::ChestDensity;
use serde::Deserialize;

/// Minimum tick interval accepted from config or the operator API.
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an unusable world.
    #[error("invalid config: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `hexclash-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HexclashConfig {
    /// World geometry, tick rate and seed.
    #[serde(default)]
    pub world: WorldConfig,

    /// Starting stats for newly joined agents.
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Chest spawner density.
    #[serde(default)]
    pub chests: ChestDensity,

    /// HTTP and `WebSocket` listener.
    #[serde(default)]
    pub server: ServerConfig,

    /// Run boundaries.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HexclashConfig {
    /// Load configuration from a YAML file, then apply environment
    /// overrides and validate.
    ///
    /// Recognized variables:
    /// - `HEXCLASH_HOST` overrides `server.host`
    /// - `HEXCLASH_PORT` overrides `server.port`
    /// - `HEXCLASH_TICK_INTERVAL_MS` overrides `world.tick_interval_ms`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if an override or the result is unusable.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. An empty string yields the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric variable does not
    /// parse.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric variable does not
    /// parse.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup("HEXCLASH_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("HEXCLASH_PORT") {
            self.server.port = parse_var("HEXCLASH_PORT", &port)?;
        }
        if let Some(ms) = lookup("HEXCLASH_TICK_INTERVAL_MS") {
            self.world.tick_interval_ms = parse_var("HEXCLASH_TICK_INTERVAL_MS", &ms)?;
        }
        Ok(())
    }

    /// Reject configurations the simulation cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for inverted bounds or a tick
    /// interval below [`MIN_TICK_INTERVAL_MS`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let b = self.world.bounds;
        if !b.is_valid() {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "world.bounds is empty: q {}..={}, r {}..={}",
                    b.min_q, b.max_q, b.min_r, b.max_r
                ),
            });
        }
        if self.world.tick_interval_ms < MIN_TICK_INTERVAL_MS {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "world.tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}, got {}",
                    self.world.tick_interval_ms
                ),
            });
        }
        Ok(())
    }
}

fn parse_var<T: core::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: core::fmt::Display,
{
    raw.trim().parse().map_err(|e| ConfigError::Invalid {
        reason: format!("{key}={raw:?}: {e}"),
    })
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Playable region.
    #[serde(default)]
    pub bounds: Bounds,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Seed for all spawn randomness. `None` seeds from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            tick_interval_ms: default_tick_interval_ms(),
            seed: None,
        }
    }
}

/// Starting stats for agents created on join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AgentsConfig {
    /// Policy a new agent starts with.
    #[serde(default)]
    pub default_mode: Mode,

    /// Starting level.
    #[serde(default = "default_one")]
    pub level: u32,

    /// Starting hit points.
    #[serde(default = "default_hp")]
    pub hp: u32,

    /// Starting speed.
    #[serde(default = "default_one")]
    pub speed: u32,

    /// Random draws before falling back to a scan for a free spawn tile.
    #[serde(default = "default_spawn_attempts")]
    pub spawn_attempts: u64,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            default_mode: Mode::default(),
            level: default_one(),
            hp: default_hp(),
            speed: default_one(),
            spawn_attempts: default_spawn_attempts(),
        }
    }
}

/// HTTP and `WebSocket` listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// How long a new connection has to send its `HELLO` frame.
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
        }
    }
}

/// Simulation boundary parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Stop after this many ticks (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Stop after this many wall-clock seconds (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_tick_interval_ms() -> u64 {
    2000
}

const fn default_one() -> u32 {
    1
}

const fn default_hp() -> u32 {
    10
}

const fn default_spawn_attempts() -> u64 {
    100
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

const fn default_handshake_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = HexclashConfig::default();
        assert_eq!(config.world.bounds, Bounds::new(-50, 50, -50, 50));
        assert_eq!(config.world.tick_interval_ms, 2000);
        assert_eq!(config.world.seed, None);
        assert_eq!(config.agents.default_mode, Mode::Aggressive);
        assert_eq!(config.agents.hp, 10);
        assert_eq!(config.chests, ChestDensity::default());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        assert_eq!(HexclashConfig::parse("").unwrap(), HexclashConfig::default());
        assert_eq!(
            HexclashConfig::parse("# nothing\n").unwrap(),
            HexclashConfig::default()
        );
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
world:
  bounds:
    min_q: -10
    max_q: 10
    min_r: -5
    max_r: 5
  tick_interval_ms: 500
  seed: 7

agents:
  default_mode: SCAVENGE
  level: 2
  hp: 20
  speed: 3

chests:
  tiles_per_chest: 100
  min_chests: 3

server:
  host: 127.0.0.1
  port: 9000
  handshake_timeout_ms: 1000

simulation:
  max_ticks: 50

logging:
  level: debug
  format: json
";
        let config = HexclashConfig::parse(yaml).unwrap();
        assert_eq!(config.world.bounds, Bounds::new(-10, 10, -5, 5));
        assert_eq!(config.world.tick_interval_ms, 500);
        assert_eq!(config.world.seed, Some(7));
        assert_eq!(config.agents.default_mode, Mode::Scavenge);
        assert_eq!(config.agents.speed, 3);
        assert_eq!(config.agents.spawn_attempts, 100);
        assert_eq!(config.chests.tiles_per_chest, 100);
        assert_eq!(config.chests.min_chests, 3);
        assert_eq!(config.chests.bonus_per_agent, 2);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.simulation.max_ticks, 50);
        assert_eq!(config.simulation.max_real_time_seconds, 0);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn camel_case_bounds_are_accepted() {
        let yaml = "world:\n  bounds: { minQ: -2, maxQ: 2, minR: -3, maxR: 3 }\n";
        let config = HexclashConfig::parse(yaml).unwrap();
        assert_eq!(config.world.bounds, Bounds::new(-2, 2, -3, 3));
    }

    #[test]
    fn validate_rejects_inverted_bounds_and_fast_ticks() {
        let mut config = HexclashConfig::default();
        config.world.bounds = Bounds::new(5, -5, 0, 0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        let mut config = HexclashConfig::default();
        config.world.tick_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn overrides_replace_listener_and_interval() {
        let mut config = HexclashConfig::default();
        config
            .apply_overrides(|key| match key {
                "HEXCLASH_HOST" => Some(String::from("127.0.0.1")),
                "HEXCLASH_PORT" => Some(String::from("9100")),
                "HEXCLASH_TICK_INTERVAL_MS" => Some(String::from(" 250 ")),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.world.tick_interval_ms, 250);
    }

    #[test]
    fn unparsable_override_is_an_error() {
        let mut config = HexclashConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "HEXCLASH_PORT").then(|| String::from("eighty"))
        });
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(matches!(
            HexclashConfig::parse("world: [unclosed"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn shipped_config_file_spells_out_the_defaults() {
        let shipped = HexclashConfig::parse(include_str!("../../../hexclash-config.yaml")).unwrap();
        assert_eq!(shipped, HexclashConfig::default());
    }
}
