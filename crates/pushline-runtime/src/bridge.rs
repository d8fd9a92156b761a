//! Readiness gate for the native messaging bridge
//!
//! The transport behind a session can finish wiring after the session exists.
//! The gate probes the service object for every required capability with
//! exponential backoff and gives up once the configured ceiling is reached.

use std::sync::Arc;
use std::time::Duration;

use pushline_core::{BridgeConfig, BridgeUnavailable, Capability, MessagingBackend, MessagingService};
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::session::SessionHandle;

const MIN_BACKOFF: Duration = Duration::from_millis(1);

/// Bounded wait for the messaging service to become callable
#[derive(Debug, Clone)]
pub struct BridgeReadinessGate {
    config: BridgeConfig,
}

impl BridgeReadinessGate {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// First required capability `service` does not expose
    pub fn probe(&self, service: &dyn MessagingService) -> Option<Capability> {
        self.config
            .required_capabilities
            .iter()
            .copied()
            .find(|capability| !service.supports(*capability))
    }

    /// Wait until the service bound to `session` exposes every required capability
    pub async fn await_ready(
        &self,
        backend: &dyn MessagingBackend,
        session: &SessionHandle,
    ) -> Result<Arc<dyn MessagingService>, BridgeUnavailable> {
        let started = Instant::now();
        let deadline = started + self.config.ready_timeout();
        let mut backoff = self.config.initial_backoff().max(MIN_BACKOFF);
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            let missing = match backend.messaging_service(session.info()) {
                Some(service) => match self.probe(service.as_ref()) {
                    None => {
                        info!(
                            attempts,
                            waited_ms = started.elapsed().as_millis() as u64,
                            "Messaging bridge ready"
                        );
                        return Ok(service);
                    }
                    Some(capability) => Some(capability),
                },
                None => None,
            };

            let now = Instant::now();
            if now >= deadline {
                let err = BridgeUnavailable {
                    missing,
                    attempts,
                    waited_ms: started.elapsed().as_millis() as u64,
                };
                error!(%err, "Giving up on messaging bridge");
                return Err(err);
            }

            match missing {
                Some(capability) => debug!(attempts, %capability, "Bridge capability missing, retrying"),
                None => debug!(attempts, "Messaging service not exposed yet, retrying"),
            }

            tokio::time::sleep(backoff.min(deadline - now)).await;
            backoff = (backoff * 2).min(self.config.max_backoff().max(MIN_BACKOFF));
        }
    }
}

impl Default for BridgeReadinessGate {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionInitializer;
    use pushline_core::ProviderConfig;
    use pushline_harness::{MockBackend, MockMessagingService};

    async fn session_for(backend: Arc<MockBackend>) -> SessionHandle {
        SessionInitializer::new(backend, ProviderConfig::embedded().unwrap())
            .acquire()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_ready_immediately() {
        let backend = Arc::new(MockBackend::new());
        let session = session_for(backend.clone()).await;
        let gate = BridgeReadinessGate::new(BridgeConfig::testing());

        assert!(gate.await_ready(backend.as_ref(), &session).await.is_ok());
        assert_eq!(backend.probe_calls(), 1);
    }

    #[tokio::test]
    async fn test_ready_after_several_probes() {
        let backend = Arc::new(MockBackend::new().with_bridge_ready_after(3));
        let session = session_for(backend.clone()).await;
        let gate = BridgeReadinessGate::new(BridgeConfig::testing());

        assert!(gate.await_ready(backend.as_ref(), &session).await.is_ok());
        assert_eq!(backend.probe_calls(), 4);
    }

    #[tokio::test]
    async fn test_missing_capability_is_reported() {
        let service = Arc::new(MockMessagingService::new().without(Capability::GetToken));
        let backend = Arc::new(MockBackend::new().with_service(service));
        let session = session_for(backend.clone()).await;
        let gate = BridgeReadinessGate::new(BridgeConfig {
            ready_timeout_ms: 20,
            ..BridgeConfig::testing()
        });

        let err = gate.await_ready(backend.as_ref(), &session).await.err().unwrap();
        assert_eq!(err.missing, Some(Capability::GetToken));
        assert!(err.attempts > 1);
    }

    #[tokio::test]
    async fn test_service_never_exposed() {
        let backend = Arc::new(MockBackend::new().with_bridge_ready_after(u32::MAX));
        let session = session_for(backend.clone()).await;
        let gate = BridgeReadinessGate::new(BridgeConfig {
            ready_timeout_ms: 10,
            ..BridgeConfig::testing()
        });

        let err = gate.await_ready(backend.as_ref(), &session).await.err().unwrap();
        assert_eq!(err.missing, None);
    }

    #[test]
    fn test_probe_reports_first_missing_in_config_order() {
        let gate = BridgeReadinessGate::default();
        let service = MockMessagingService::new()
            .without(Capability::OnMessage)
            .without(Capability::RequestPermission);
        assert_eq!(gate.probe(&service), Some(Capability::RequestPermission));
    }
}
