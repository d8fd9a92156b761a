//! pushline CLI Configuration
//!
//! The configuration file (`pushline.toml`) holds the pipeline configuration
//! plus a few settings of the simulator itself. Missing sections fall back to
//! their defaults; command line flags are applied on top by the caller.

use std::path::Path;

use serde::{Deserialize, Serialize};

use pushline_core::{ChannelConfig, ForegroundPolicy, PipelineConfig};

// ----------------------------------------------------------------------------
// CLI Application Configuration
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pipeline: PipelineConfig,
    pub simulator: SimulatorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// How long a step may wait for the pipeline to catch up
    pub settle_timeout_ms: u64,
    /// Start session acquisition right after the pipeline starts
    pub warm_up: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            settle_timeout_ms: 1_000,
            warm_up: true,
        }
    }
}

/// Settings given on the command line; each one wins over the file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub foreground: Option<ForegroundPolicy>,
    pub warm_up: Option<bool>,
    pub ready_timeout_ms: Option<u64>,
    pub dedup_capacity: Option<usize>,
    /// Use the small registration channel buffers
    pub low_memory: bool,
}

impl AppConfig {
    /// Create a configuration from an optional file with command line overrides
    pub fn load_with_overrides(
        path: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Apply command line overrides on top of the loaded values
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(policy) = overrides.foreground {
            self.pipeline.foreground = policy;
        }
        if let Some(warm_up) = overrides.warm_up {
            self.simulator.warm_up = warm_up;
        }
        if let Some(timeout) = overrides.ready_timeout_ms {
            self.pipeline.bridge.ready_timeout_ms = timeout;
        }
        if let Some(capacity) = overrides.dedup_capacity {
            self.pipeline.dedup.capacity = capacity;
        }
        if overrides.low_memory {
            self.pipeline.channels = ChannelConfig::low_memory();
        }
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Loading(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&source)
            .map_err(|e| ConfigError::Loading(format!("Failed to load from {}: {}", path.display(), e)))
    }

    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Loading(e.to_string()))
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bridge = &self.pipeline.bridge;
        if bridge.ready_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "bridge.ready_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if bridge.initial_backoff_ms > bridge.max_backoff_ms {
            return Err(ConfigError::Validation(format!(
                "bridge.initial_backoff_ms ({}) exceeds bridge.max_backoff_ms ({})",
                bridge.initial_backoff_ms, bridge.max_backoff_ms
            )));
        }
        if bridge.required_capabilities.is_empty() {
            return Err(ConfigError::Validation(
                "bridge.required_capabilities must name at least one capability".to_string(),
            ));
        }

        if self.pipeline.dedup.capacity == 0 {
            return Err(ConfigError::Validation(
                "dedup.capacity must be greater than 0".to_string(),
            ));
        }

        let channel = &self.pipeline.notification_channel;
        if channel.id.trim().is_empty() || channel.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "notification_channel needs a non-empty id and name".to_string(),
            ));
        }

        Ok(())
    }

    /// Create example configuration file content
    pub fn example_config() -> String {
        let mut example = AppConfig::default();
        example.pipeline.provider.api_key = "<api key>".to_string();

        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| "# Failed to generate example config".to_string())
    }
}

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration loading error: {0}")]
    Loading(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
