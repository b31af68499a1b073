//! Configuration loading for the action simulation.
//!
//! All tunables are loaded from a TOML file. Every section is optional and
//! falls back to its defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Tick loop settings
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Authority to observer replication settings
    #[serde(default)]
    pub replication: ReplicationConfig,
    /// In-process link behavior
    #[serde(default)]
    pub network: NetworkConfig,
    /// Delayed ranged attack tuning
    #[serde(default)]
    pub projectile: ProjectileConfig,
    /// Sprint tuning
    #[serde(default)]
    pub sprint: SprintConfig,
    /// Invariant reporting
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

impl SimConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values TOML accepts but the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tick = self.simulation.tick_seconds;
        if !tick.is_finite() || tick <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "simulation.tick_seconds",
                reason: format!("expected a positive number of seconds, got {tick}"),
            });
        }
        for (field, rate) in [
            ("network.relay_loss_rate", self.network.relay_loss_rate),
            ("network.duplicate_rate", self.network.duplicate_rate),
        ] {
            if !rate.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("expected a probability, got {rate}"),
                });
            }
        }
        Ok(())
    }

    /// Serializes this configuration as pretty TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Tick loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated seconds per tick
    pub tick_seconds: f32,
    /// Number of ticks the binary runs
    pub ticks: u64,
    /// Seed for the loopback link's loss/duplication RNG
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_seconds: 0.05,
            ticks: 200,
            seed: 42,
        }
    }
}

/// Replication settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    /// Ticks between full snapshots; 0 disables periodic snapshots
    pub snapshot_interval_ticks: u64,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            snapshot_interval_ticks: 50,
        }
    }
}

/// Loopback link behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Probability that a relay request is lost (0.0 to 1.0)
    pub relay_loss_rate: f64,
    /// Probability that a replication message is delivered twice (0.0 to 1.0)
    pub duplicate_rate: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            relay_loss_rate: 0.0,
            duplicate_rate: 0.0,
        }
    }
}

/// Delayed ranged attack tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Seconds between the cast cue and the projectile spawn
    pub attack_delay: f32,
    /// Length of the aim probe
    pub max_range: f32,
    /// Radius of the swept probe sphere
    pub sweep_radius: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            attack_delay: 0.2,
            max_range: 5000.0,
            sweep_radius: 20.0,
        }
    }
}

/// Sprint tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SprintConfig {
    /// Movement speed added while sprinting
    pub speed_bonus: f32,
}

impl Default for SprintConfig {
    fn default() -> Self {
        Self { speed_bonus: 200.0 }
    }
}

/// Invariant reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Panic on invariant violations instead of logging and continuing
    pub panic_on_invariant: bool,
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Returns the default configuration as a TOML string.
pub fn default_config_toml() -> Result<String, ConfigError> {
    SimConfig::default().to_toml()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SimConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.projectile.attack_delay, 0.2);
        assert_eq!(config.projectile.max_range, 5000.0);
    }

    #[test]
    fn test_partial_section() {
        let config = SimConfig::from_toml_str(
            r#"
            [projectile]
            attack_delay = 0.5

            [network]
            relay_loss_rate = 0.25
            "#,
        )
        .unwrap();

        assert_eq!(config.projectile.attack_delay, 0.5);
        assert_eq!(config.projectile.sweep_radius, 20.0);
        assert_eq!(config.network.relay_loss_rate, 0.25);
        assert_eq!(config.replication.snapshot_interval_ticks, 50);
    }

    #[test]
    fn test_default_toml_parses_back() {
        let toml = default_config_toml().unwrap();
        assert!(toml.contains("[replication]"));
        let parsed = SimConfig::from_toml_str(&toml).unwrap();
        assert_eq!(parsed, SimConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        let result = SimConfig::from_toml_str("[simulation\nticks = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_non_finite_rates_rejected() {
        let result = SimConfig::from_toml_str("[network]\nrelay_loss_rate = nan\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "network.relay_loss_rate",
                ..
            })
        ));

        let result = SimConfig::from_toml_str("[network]\nduplicate_rate = inf\n");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "network.duplicate_rate",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_tick_rejected() {
        let result = SimConfig::from_toml_str("[simulation]\ntick_seconds = 0.0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[simulation]\nticks = 12").unwrap();

        let config = SimConfig::from_file(file.path()).unwrap();
        assert_eq!(config.simulation.ticks, 12);
    }

    #[test]
    fn test_missing_file() {
        let result = SimConfig::from_file(Path::new("does/not/exist.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
