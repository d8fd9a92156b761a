//! Pipeline Communication Types
//!
//! Everything the host platform hands to the pipeline, and everything the pipeline
//! hands back to the host application, travels as one of these messages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::types::RemoteMessage;

/// Data keys that name a navigation target, in lookup order
pub const ROUTE_KEYS: [&str; 3] = ["route", "screen", "link"];

// ----------------------------------------------------------------------------
// Process Lifecycle
// ----------------------------------------------------------------------------

/// Lifecycle state of the app process when a message arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    /// Process running, UI visible
    Foreground,
    /// Process alive, no UI
    Background,
    /// Process started only to run the handler
    Killed,
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppState::Foreground => write!(f, "foreground"),
            AppState::Background => write!(f, "background"),
            AppState::Killed => write!(f, "killed"),
        }
    }
}

// ----------------------------------------------------------------------------
// Transport → Pipeline
// ----------------------------------------------------------------------------

/// A message delivered to the background/killed-state registration point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub message: RemoteMessage,
    pub state: AppState,
}

impl InboundMessage {
    pub fn background(message: RemoteMessage) -> Self {
        Self {
            message,
            state: AppState::Background,
        }
    }

    pub fn killed(message: RemoteMessage) -> Self {
        Self {
            message,
            state: AppState::Killed,
        }
    }
}

/// Events delivered to the foreground listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForegroundEvent {
    /// A message arrived while the UI is visible
    Message(RemoteMessage),
    /// The user opened the app from the background by tapping a notification
    NotificationOpened(RemoteMessage),
    /// The provider rotated the registration token
    TokenRefreshed(String),
}

// ----------------------------------------------------------------------------
// Pipeline → Host Application
// ----------------------------------------------------------------------------

/// Where a routed intent came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentSource {
    /// Press on a notification rendered by the pipeline
    NotificationPress,
    /// Tap on an OS-rendered notification while the app was in the background
    NotificationOpened,
    /// Tap on a notification that launched the app from the killed state
    InitialNotification,
}

/// Application-level action queued for the next time the UI mounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIntent {
    /// Navigation target, `None` means "just open the app"
    pub route: Option<String>,
    pub params: BTreeMap<String, String>,
    pub source: IntentSource,
}

impl AppIntent {
    /// Derive an intent from a notification's data payload
    pub fn from_payload(payload: &BTreeMap<String, String>, source: IntentSource) -> Self {
        let route = ROUTE_KEYS
            .iter()
            .filter_map(|key| payload.get(*key))
            .find(|value| !value.is_empty())
            .cloned();

        let params = payload
            .iter()
            .filter(|(key, _)| !ROUTE_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            route,
            params,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_route_key_precedence() {
        let intent = AppIntent::from_payload(
            &payload(&[("screen", "Transfer"), ("route", "Bills"), ("id", "42")]),
            IntentSource::NotificationPress,
        );
        assert_eq!(intent.route.as_deref(), Some("Bills"));
        assert_eq!(intent.params, payload(&[("id", "42")]));
    }

    #[test]
    fn test_empty_route_falls_through() {
        let intent = AppIntent::from_payload(
            &payload(&[("route", ""), ("link", "app://promo")]),
            IntentSource::NotificationOpened,
        );
        assert_eq!(intent.route.as_deref(), Some("app://promo"));
    }

    #[test]
    fn test_no_route_opens_app() {
        let intent =
            AppIntent::from_payload(&payload(&[("title", "x")]), IntentSource::InitialNotification);
        assert!(intent.route.is_none());
        assert_eq!(intent.params.len(), 1);
    }
}
