//! Notification permission
//!
//! Maps provider status codes onto [`PermissionState`] and a boolean capability.
//! A denied permission is a normal outcome, not an error. Once the OS reports a
//! terminal state the user is not prompted again.

use std::sync::Arc;

use pushline_core::PermissionState;
use tracing::{debug, error, info, warn};

use crate::messaging::MessagingAccess;

pub struct PermissionManager {
    messaging: Arc<MessagingAccess>,
}

impl PermissionManager {
    pub fn new(messaging: Arc<MessagingAccess>) -> Self {
        Self { messaging }
    }

    /// Ask for notification permission.
    ///
    /// Returns `false` when messaging is unavailable, when the user declines, or
    /// when the provider fails. May suspend for as long as the OS prompt is open.
    pub async fn request_permission(&self) -> bool {
        let Some(service) = self.messaging.service().await else {
            warn!("Messaging not available, skipping permission request");
            return false;
        };

        match service.permission_status().await {
            Ok(code) => {
                let state = PermissionState::from_code(code);
                if state.is_terminal() {
                    debug!(%state, "Permission already decided, not prompting");
                    return state.is_enabled();
                }
            }
            Err(err) => debug!(%err, "Could not read permission status, prompting anyway"),
        }

        match service.request_permission().await {
            Ok(code) => {
                let enabled = PermissionState::code_enables(code);
                if enabled {
                    info!(status = code, "Notification permission granted");
                } else {
                    info!(status = code, "Notification permission not granted");
                }
                enabled
            }
            Err(err) => {
                error!(%err, "Error requesting notification permission");
                false
            }
        }
    }

    /// Current authorization without prompting
    pub async fn current_status(&self) -> PermissionState {
        let Some(service) = self.messaging.service().await else {
            return PermissionState::Undetermined;
        };

        match service.permission_status().await {
            Ok(code) => PermissionState::from_code(code),
            Err(err) => {
                warn!(%err, "Could not read permission status");
                PermissionState::Undetermined
            }
        }
    }
}
