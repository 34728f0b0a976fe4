//! Kernel configuration.
//!
//! The canonical configuration lives in `nucleus-config.yaml` at the project
//! root. Every key is optional, so an empty document yields a valid default
//! configuration.

use std::path::Path;

use serde::Deserialize;

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

    /// The configuration parsed but is inconsistent.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level kernel configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct KernelConfig {
    /// Run parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Property store parameters.
    #[serde(default)]
    pub properties: PropertiesConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl KernelConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if the values are inconsistent.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if the values are inconsistent.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a time is not finite, `max_time`
    /// precedes `start_time`, or the initial capacity is negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let simulation = &self.simulation;
        if !simulation.start_time.is_finite() {
            return Err(ConfigError::Invalid {
                reason: format!("start_time must be finite, got {}", simulation.start_time),
            });
        }
        if let Some(max_time) = simulation.max_time {
            if !max_time.is_finite() {
                return Err(ConfigError::Invalid {
                    reason: format!("max_time must be finite, got {max_time}"),
                });
            }
            if max_time < simulation.start_time {
                return Err(ConfigError::Invalid {
                    reason: format!(
                        "max_time {max_time} precedes start_time {}",
                        simulation.start_time
                    ),
                });
            }
        }
        if self.properties.initial_capacity < 0 {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "initial_capacity must not be negative, got {}",
                    self.properties.initial_capacity
                ),
            });
        }
        Ok(())
    }
}

/// Run parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Seed of the per-kernel random generator.
    #[serde(default)]
    pub seed: u64,

    /// Simulation time when the run starts.
    #[serde(default)]
    pub start_time: f64,

    /// Plans scheduled after this time are not executed.
    #[serde(default)]
    pub max_time: Option<f64>,
}

/// Property store parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PropertiesConfig {
    /// Initial capacity of every property manager created by the kernel.
    #[serde(default)]
    pub initial_capacity: i64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Fallback filter (trace, debug, info, warn, error) used when
    /// `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}
