//! Registration token flow
//!
//! The token is only meaningful once messaging is ready and the user granted
//! notifications, so both are checked before asking the provider.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::messaging::MessagingAccess;
use crate::permission::PermissionManager;

pub struct TokenManager {
    messaging: Arc<MessagingAccess>,
    permissions: Arc<PermissionManager>,
    latest: RwLock<Option<String>>,
}

impl TokenManager {
    pub fn new(messaging: Arc<MessagingAccess>, permissions: Arc<PermissionManager>) -> Self {
        Self {
            messaging,
            permissions,
            latest: RwLock::new(None),
        }
    }

    /// Fetch the registration token for this installation.
    ///
    /// `None` when messaging is disabled, permission is not granted, or the
    /// provider has no token to give.
    pub async fn fetch_token(&self) -> Option<String> {
        let Some(service) = self.messaging.service().await else {
            return None;
        };

        if !self.permissions.request_permission().await {
            info!("Notification permission not granted, no token fetched");
            return None;
        }

        match service.get_token().await {
            Ok(Some(token)) => {
                debug!(len = token.len(), "Registration token fetched");
                *self.latest.write().await = Some(token.clone());
                Some(token)
            }
            Ok(None) => {
                warn!("Provider returned no registration token");
                None
            }
            Err(err) => {
                warn!(%err, "Failed to fetch registration token");
                None
            }
        }
    }

    /// Remember a token pushed by the provider after rotation
    pub async fn record_refresh(&self, token: String) {
        info!(len = token.len(), "Registration token refreshed");
        *self.latest.write().await = Some(token);
    }

    /// Most recently seen token, without calling the provider
    pub async fn latest(&self) -> Option<String> {
        self.latest.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pushline_core::{BridgeConfig, ProviderConfig};
    use pushline_harness::{InitBehavior, MockBackend, MockMessagingService};

    fn manager(backend: MockBackend) -> TokenManager {
        let access = Arc::new(MessagingAccess::new(
            Arc::new(backend),
            ProviderConfig::embedded().unwrap(),
            BridgeConfig::testing(),
        ));
        let permissions = Arc::new(PermissionManager::new(Arc::clone(&access)));
        TokenManager::new(access, permissions)
    }

    #[tokio::test]
    async fn test_token_fetched_when_permitted() {
        let tokens = manager(MockBackend::new());
        assert_eq!(tokens.fetch_token().await.as_deref(), Some("mock-token"));
        assert_eq!(tokens.latest().await.as_deref(), Some("mock-token"));
    }

    #[tokio::test]
    async fn test_no_token_without_permission() {
        let service = Arc::new(MockMessagingService::new().with_request_code(0));
        let tokens = manager(MockBackend::new().with_service(service));
        assert!(tokens.fetch_token().await.is_none());
        assert!(tokens.latest().await.is_none());
    }

    #[tokio::test]
    async fn test_no_token_when_messaging_disabled() {
        let tokens = manager(MockBackend::new().with_init(InitBehavior::Fail("offline".into())));
        assert!(tokens.fetch_token().await.is_none());
    }

    #[tokio::test]
    async fn test_refresh_replaces_latest() {
        let service = Arc::new(MockMessagingService::new().with_token(None));
        let tokens = manager(MockBackend::new().with_service(service));

        assert!(tokens.fetch_token().await.is_none());
        tokens.record_refresh("rotated".to_string()).await;
        assert_eq!(tokens.latest().await.as_deref(), Some("rotated"));
    }
}
