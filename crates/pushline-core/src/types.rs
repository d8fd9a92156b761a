//! Core types for the notification pipeline
//!
//! This module defines the data model shared by every stage of the pipeline,
//! using newtype patterns for identifiers so message ids and notification ids
//! cannot be mixed up.

use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Action id the notification center reports for a plain tap on the notification body
pub const DEFAULT_ACTION_ID: &str = "default";

// ----------------------------------------------------------------------------
// Identifiers
// ----------------------------------------------------------------------------

/// Identifier assigned to a remote message by the push-delivery transport
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a notification rendered on the device
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random notification id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ----------------------------------------------------------------------------
// Timestamp
// ----------------------------------------------------------------------------

/// Milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn new(millis: u64) -> Self {
        Self(millis)
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self(millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

// ----------------------------------------------------------------------------
// Remote Message
// ----------------------------------------------------------------------------

/// Notification block attached by the sender; the OS renders it on its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
}

/// A message delivered by the push transport. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMessage {
    pub message_id: MessageId,
    #[serde(default)]
    pub sent_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationPayload>,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

impl RemoteMessage {
    /// A message carrying only a data map
    pub fn data_only<I, K, V>(message_id: impl Into<String>, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            message_id: MessageId::new(message_id),
            sent_time: Timestamp::now(),
            notification: None,
            data: data.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// A message carrying a notification block and an empty data map
    pub fn with_notification(
        message_id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            message_id: MessageId::new(message_id),
            sent_time: Timestamp::now(),
            notification: Some(NotificationPayload {
                title: title.into(),
                body: body.into(),
            }),
            data: BTreeMap::new(),
        }
    }

    /// Add one data entry
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Non-empty data value for `key`
    pub fn data_value(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

// ----------------------------------------------------------------------------
// Classification Result
// ----------------------------------------------------------------------------

/// Content for a notification built from a data-only payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synthesis {
    pub title: String,
    pub body: String,
    pub data: BTreeMap<String, String>,
}

/// Outcome of classifying a remote message. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifiedIntent {
    /// The transport or OS renders it (or there is nothing to render)
    AlreadyPresented,
    /// The pipeline has to render it through the presenter
    NeedsSynthesis(Synthesis),
}

impl ClassifiedIntent {
    pub fn needs_synthesis(&self) -> bool {
        matches!(self, ClassifiedIntent::NeedsSynthesis(_))
    }
}

// ----------------------------------------------------------------------------
// Permission State
// ----------------------------------------------------------------------------

/// Notification authorization as reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionState {
    Undetermined,
    Denied,
    Authorized,
    Provisional,
}

impl PermissionState {
    pub const CODE_NOT_DETERMINED: i32 = -1;
    pub const CODE_DENIED: i32 = 0;
    pub const CODE_AUTHORIZED: i32 = 1;
    pub const CODE_PROVISIONAL: i32 = 2;

    /// Map a provider status code. Unknown codes are treated as denied.
    pub fn from_code(code: i32) -> Self {
        match code {
            Self::CODE_NOT_DETERMINED => PermissionState::Undetermined,
            Self::CODE_AUTHORIZED => PermissionState::Authorized,
            Self::CODE_PROVISIONAL => PermissionState::Provisional,
            _ => PermissionState::Denied,
        }
    }

    /// Whether a raw provider status code grants notification capability
    pub fn code_enables(code: i32) -> bool {
        code == Self::CODE_AUTHORIZED || code == Self::CODE_PROVISIONAL
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, PermissionState::Authorized | PermissionState::Provisional)
    }

    /// States after which the OS will not prompt the user again
    pub fn is_terminal(&self) -> bool {
        matches!(self, PermissionState::Authorized | PermissionState::Denied)
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionState::Undetermined => write!(f, "undetermined"),
            PermissionState::Denied => write!(f, "denied"),
            PermissionState::Authorized => write!(f, "authorized"),
            PermissionState::Provisional => write!(f, "provisional"),
        }
    }
}

// ----------------------------------------------------------------------------
// Notification Channel
// ----------------------------------------------------------------------------

/// Presentation importance of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Default,
    #[default]
    High,
}

/// OS-level notification category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationChannel {
    pub id: String,
    pub name: String,
    pub sound_enabled: bool,
    #[serde(default)]
    pub importance: Importance,
}

impl NotificationChannel {
    pub fn new(id: impl Into<String>, name: impl Into<String>, sound_enabled: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sound_enabled,
            importance: Importance::High,
        }
    }
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new("default", "Default Channel", true)
    }
}

// ----------------------------------------------------------------------------
// Interaction Events
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Press,
    Dismiss,
}

/// User interaction reported by the notification center
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub kind: InteractionKind,
    pub notification_id: NotificationId,
    pub action_id: String,
    #[serde(default)]
    pub payload: BTreeMap<String, String>,
}

impl InteractionEvent {
    /// A tap on the notification body
    pub fn press(notification_id: NotificationId, payload: BTreeMap<String, String>) -> Self {
        Self {
            kind: InteractionKind::Press,
            notification_id,
            action_id: DEFAULT_ACTION_ID.to_string(),
            payload,
        }
    }

    pub fn dismiss(notification_id: NotificationId) -> Self {
        Self {
            kind: InteractionKind::Dismiss,
            notification_id,
            action_id: DEFAULT_ACTION_ID.to_string(),
            payload: BTreeMap::new(),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
