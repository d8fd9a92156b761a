//! Error types for the notification pipeline
//!
//! Session and bridge failures disable the messaging side of the pipeline for the
//! rest of the process lifetime. Presentation failures are local to one message.
//! A denied permission is not an error at all; it is a [`crate::PermissionState`].

use crate::provider::Capability;
use core::fmt;

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Failures while acquiring the messaging session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Messaging session is misconfigured: {reason}")]
    Misconfigured { reason: String },
    /// Reported by the provider when a session was created concurrently.
    /// The initializer resolves it by fetching the existing session.
    #[error("Messaging session already exists")]
    AlreadyExists,
    #[error("Messaging provider failed: {reason}")]
    Provider { reason: String },
}

/// The native bridge behind a session never became callable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeUnavailable {
    /// Last capability the probe found missing; `None` if the service never appeared
    pub missing: Option<Capability>,
    pub attempts: u32,
    pub waited_ms: u64,
}

impl fmt::Display for BridgeUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.missing {
            Some(capability) => write!(
                f,
                "Messaging bridge unavailable: capability `{}` missing after {} probes ({}ms)",
                capability, self.attempts, self.waited_ms
            ),
            None => write!(
                f,
                "Messaging bridge unavailable: service not exposed after {} probes ({}ms)",
                self.attempts, self.waited_ms
            ),
        }
    }
}

impl std::error::Error for BridgeUnavailable {}

/// Failures while rendering a notification
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PresentationError {
    #[error("Notification refused by the OS: {reason}")]
    Refused { reason: String },
    #[error("Failed to set up channel {channel_id}: {reason}")]
    ChannelSetup { channel_id: String, reason: String },
    #[error("Notification permission missing")]
    PermissionMissing,
}

/// Registration channel failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel buffer is full")]
    ChannelFull,
    #[error("Channel is closed")]
    ChannelClosed,
}

impl<T> From<tokio::sync::mpsc::error::TrySendError<T>> for ChannelError {
    fn from(err: tokio::sync::mpsc::error::TrySendError<T>) -> Self {
        match err {
            tokio::sync::mpsc::error::TrySendError::Full(_) => ChannelError::ChannelFull,
            tokio::sync::mpsc::error::TrySendError::Closed(_) => ChannelError::ChannelClosed,
        }
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for ChannelError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        ChannelError::ChannelClosed
    }
}

// ----------------------------------------------------------------------------
// Pipeline Error
// ----------------------------------------------------------------------------

/// Unified error type for the pipeline
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error(transparent)]
    Bridge(#[from] BridgeUnavailable),

    #[error("Presentation error: {0}")]
    Presentation(#[from] PresentationError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },
}

impl PipelineError {
    /// Create a configuration error with a reason
    pub fn config_error<T: Into<String>>(reason: T) -> Self {
        PipelineError::Configuration {
            reason: reason.into(),
        }
    }

    /// Errors after which messaging stays disabled for the process lifetime
    pub fn disables_messaging(&self) -> bool {
        matches!(self, PipelineError::Session(_) | PipelineError::Bridge(_))
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, PipelineError>;
