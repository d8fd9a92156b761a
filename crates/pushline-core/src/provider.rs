//! External collaborator contracts
//!
//! The pipeline never talks to a platform directly. The messaging provider, the
//! native bridge behind it and the OS notification center are reached through
//! the traits in this module. Concrete implementations live with the host
//! application; `pushline-harness` provides in-memory ones for tests.

use async_trait::async_trait;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::errors::{PresentationError, SessionError};
use crate::types::{NotificationId, RemoteMessage};
use crate::Result;

// ----------------------------------------------------------------------------
// Capabilities
// ----------------------------------------------------------------------------

/// A method the messaging service must expose before it is usable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    GetToken,
    RequestPermission,
    HasPermission,
    OnMessage,
    OnNotificationOpenedApp,
    GetInitialNotification,
}

impl Capability {
    /// Method name as exposed by the native module
    pub fn method_name(&self) -> &'static str {
        match self {
            Capability::GetToken => "getToken",
            Capability::RequestPermission => "requestPermission",
            Capability::HasPermission => "hasPermission",
            Capability::OnMessage => "onMessage",
            Capability::OnNotificationOpenedApp => "onNotificationOpenedApp",
            Capability::GetInitialNotification => "getInitialNotification",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

// ----------------------------------------------------------------------------
// Messaging Provider
// ----------------------------------------------------------------------------

/// Description of a provider session as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Provider app name, `[DEFAULT]` for the auto-created one
    pub name: String,
    pub project_id: String,
}

/// Session-level entrypoint of the messaging provider
#[async_trait]
pub trait MessagingBackend: Send + Sync {
    /// Session the host already created from its static configuration, if any
    async fn detect_default(&self) -> Option<SessionInfo>;

    /// Explicitly create a session from the embedded credentials.
    ///
    /// Returns [`SessionError::AlreadyExists`] if another caller won the race.
    async fn initialize(&self, config: &ProviderConfig) -> core::result::Result<SessionInfo, SessionError>;

    /// Fetch the session that already exists
    async fn existing(&self) -> Option<SessionInfo>;

    /// Messaging service bound to `session`, if the bridge exposes one yet
    fn messaging_service(&self, session: &SessionInfo) -> Option<Arc<dyn MessagingService>>;
}

/// Messaging methods used by the pipeline once the bridge is ready
#[async_trait]
pub trait MessagingService: Send + Sync {
    /// Whether the native object currently exposes `capability`
    fn supports(&self, capability: Capability) -> bool;

    /// Ask the OS for notification authorization; returns the raw status code
    async fn request_permission(&self) -> Result<i32>;

    /// Current raw authorization status code without prompting
    async fn permission_status(&self) -> Result<i32>;

    /// Registration token for this installation
    async fn get_token(&self) -> Result<Option<String>>;

    /// Message that launched the app from the killed state, if any
    async fn initial_notification(&self) -> Result<Option<RemoteMessage>>;
}

// ----------------------------------------------------------------------------
// Notification Subsystem
// ----------------------------------------------------------------------------

/// A single notification to render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRequest {
    pub notification_id: NotificationId,
    pub channel_id: String,
    pub title: String,
    pub body: String,
    /// Attached so the press event can recover the original data map
    pub data: BTreeMap<String, String>,
    pub sound: bool,
    pub press_action_id: String,
}

/// The on-device notification center
#[async_trait]
pub trait NotificationSubsystem: Send + Sync {
    /// Create or update a channel
    async fn create_channel(
        &self,
        channel: &crate::types::NotificationChannel,
    ) -> core::result::Result<(), PresentationError>;

    /// Render one notification
    async fn display(
        &self,
        request: DisplayRequest,
    ) -> core::result::Result<NotificationId, PresentationError>;
}
