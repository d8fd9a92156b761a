//! Messaging access
//!
//! Composes session acquisition with the bridge readiness gate into the single
//! "give me a usable messaging service" operation. The outcome is computed once;
//! after a session or bridge failure every caller gets the same error and
//! messaging stays disabled for the process lifetime.

use std::sync::Arc;

use pushline_core::{
    BridgeConfig, MessagingBackend, MessagingService, PipelineError, ProviderConfig, SessionError,
};
use tokio::sync::OnceCell;
use tracing::warn;

use crate::bridge::BridgeReadinessGate;
use crate::session::{SessionHandle, SessionInitializer};

pub struct MessagingAccess {
    backend: Arc<dyn MessagingBackend>,
    sessions: SessionInitializer,
    gate: BridgeReadinessGate,
    service: OnceCell<Result<Arc<dyn MessagingService>, PipelineError>>,
}

impl MessagingAccess {
    pub fn new(
        backend: Arc<dyn MessagingBackend>,
        provider: ProviderConfig,
        bridge: BridgeConfig,
    ) -> Self {
        Self {
            sessions: SessionInitializer::new(Arc::clone(&backend), provider),
            backend,
            gate: BridgeReadinessGate::new(bridge),
            service: OnceCell::new(),
        }
    }

    /// Acquire the process-wide session
    pub async fn acquire_session(&self) -> Result<SessionHandle, SessionError> {
        self.sessions.acquire().await
    }

    pub fn sessions(&self) -> &SessionInitializer {
        &self.sessions
    }

    /// Ready messaging service, or why there is none
    pub async fn ready(&self) -> Result<Arc<dyn MessagingService>, PipelineError> {
        self.service
            .get_or_init(|| async {
                let session = self.sessions.acquire().await?;
                let service = self.gate.await_ready(self.backend.as_ref(), &session).await?;
                Ok::<_, PipelineError>(service)
            })
            .await
            .clone()
    }

    /// Ready messaging service; `None` once messaging is disabled
    pub async fn service(&self) -> Option<Arc<dyn MessagingService>> {
        match self.ready().await {
            Ok(service) => Some(service),
            Err(err) => {
                warn!(%err, "Messaging service not available");
                None
            }
        }
    }

    /// Whether a previous attempt already disabled messaging
    pub fn is_disabled(&self) -> bool {
        matches!(self.service.get(), Some(Err(_)))
    }
}
