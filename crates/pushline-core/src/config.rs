//! Centralized Configuration Management
//!
//! All configuration structures used by the pipeline live here so the CLI and
//! host applications can load a single `PipelineConfig` from TOML.

use core::time::Duration;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::SessionError;
use crate::provider::Capability;
use crate::types::NotificationChannel;

/// Provider credentials compiled into the binary
const EMBEDDED_PROVIDER: &str = include_str!("../provider.toml");

// ----------------------------------------------------------------------------
// Provider Configuration
// ----------------------------------------------------------------------------

/// Static credentials consumed once by the explicit session initialization path
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
    pub app_id: String,
    pub project_id: String,
    pub sender_id: String,
    #[serde(default)]
    pub storage_bucket: Option<String>,
    #[serde(default)]
    pub database_url: Option<String>,
}

impl ProviderConfig {
    /// Parse the credentials record embedded at build time
    pub fn embedded() -> Result<Self, SessionError> {
        Self::from_toml(EMBEDDED_PROVIDER)
    }

    /// Parse a credentials record from TOML
    pub fn from_toml(source: &str) -> Result<Self, SessionError> {
        toml::from_str(source).map_err(|err| SessionError::Misconfigured {
            reason: format!("invalid provider record: {}", err),
        })
    }

    /// Check that every credential is present and endpoints parse
    pub fn validate(&self) -> Result<(), SessionError> {
        let required = [
            ("api_key", &self.api_key),
            ("app_id", &self.app_id),
            ("project_id", &self.project_id),
            ("sender_id", &self.sender_id),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SessionError::Misconfigured {
                    reason: format!("{} is empty", field),
                });
            }
        }

        if !self.sender_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(SessionError::Misconfigured {
                reason: format!("sender_id {:?} is not numeric", self.sender_id),
            });
        }

        if let Some(endpoint) = &self.database_url {
            let url = Url::parse(endpoint).map_err(|err| SessionError::Misconfigured {
                reason: format!("database_url {:?}: {}", endpoint, err),
            })?;
            if url.scheme() != "https" {
                return Err(SessionError::Misconfigured {
                    reason: format!("database_url {:?} must use https", endpoint),
                });
            }
        }

        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Bridge Configuration
// ----------------------------------------------------------------------------

/// Bounded readiness probing of the native messaging bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Delay before the second probe
    pub initial_backoff_ms: u64,
    /// Ceiling for a single backoff step
    pub max_backoff_ms: u64,
    /// Total time allowed for the bridge to become ready
    pub ready_timeout_ms: u64,
    /// Methods the service must expose before it is handed out
    pub required_capabilities: Vec<Capability>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 25,
            max_backoff_ms: 400,
            ready_timeout_ms: 5_000,
            required_capabilities: vec![
                Capability::GetToken,
                Capability::RequestPermission,
                Capability::OnMessage,
            ],
        }
    }
}

impl BridgeConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    /// Short timings for tests
    pub fn testing() -> Self {
        Self {
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            ready_timeout_ms: 200,
            ..Self::default()
        }
    }
}

// ----------------------------------------------------------------------------
// Channel Configuration
// ----------------------------------------------------------------------------

/// Buffer sizes of the registration channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Background/killed-state messages (transport → handler)
    pub inbound_buffer_size: usize,
    /// Notification center interactions (OS → router)
    pub interaction_buffer_size: usize,
    /// Foreground listener events (transport → foreground handler)
    pub foreground_buffer_size: usize,
    /// Routed intents waiting for the UI to mount (router → host app)
    pub intent_buffer_size: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            inbound_buffer_size: 64,
            interaction_buffer_size: 32,
            foreground_buffer_size: 64,
            intent_buffer_size: 16,
        }
    }
}

impl ChannelConfig {
    /// Create configuration for low-memory environments
    pub fn low_memory() -> Self {
        Self {
            inbound_buffer_size: 16,
            interaction_buffer_size: 8,
            foreground_buffer_size: 16,
            intent_buffer_size: 4,
        }
    }

    /// Create configuration optimized for testing
    pub fn testing() -> Self {
        Self {
            inbound_buffer_size: 100,
            interaction_buffer_size: 100,
            foreground_buffer_size: 100,
            intent_buffer_size: 100,
        }
    }
}

// ----------------------------------------------------------------------------
// Dedup / Foreground
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Number of message ids remembered per process
    pub capacity: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self { capacity: 512 }
    }
}

/// What the foreground listener does with notification-bearing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForegroundPolicy {
    /// Leave them to the OS like every other state
    #[default]
    Suppress,
    /// Render them locally, since the OS hides them while the UI is visible
    Mirror,
}

// ----------------------------------------------------------------------------
// Pipeline Configuration
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub provider: ProviderConfig,
    pub bridge: BridgeConfig,
    pub channels: ChannelConfig,
    pub notification_channel: NotificationChannel,
    pub dedup: DedupConfig,
    pub foreground: ForegroundPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::embedded().unwrap_or_default(),
            bridge: BridgeConfig::default(),
            channels: ChannelConfig::default(),
            notification_channel: NotificationChannel::default(),
            dedup: DedupConfig::default(),
            foreground: ForegroundPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Configuration with short timings and roomy buffers
    pub fn testing() -> Self {
        Self {
            bridge: BridgeConfig::testing(),
            channels: ChannelConfig::testing(),
            ..Self::default()
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
