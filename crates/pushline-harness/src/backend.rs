//! Mock messaging backend
//!
//! Session-level side of the provider. Initialization can succeed, fail, race
//! with another creator, or take a while; the bridge can take several probes
//! before the service object shows up.

use async_trait::async_trait;
use pushline_core::{MessagingBackend, MessagingService, ProviderConfig, SessionError, SessionInfo};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use crate::lock;
use crate::service::MockMessagingService;

/// Name the provider gives its auto-created session
pub const DEFAULT_SESSION_NAME: &str = "[DEFAULT]";

/// How explicit initialization responds
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InitBehavior {
    #[default]
    Succeed,
    /// Another creator won the race; the session exists
    AlreadyExists,
    Fail(String),
}

pub struct MockBackend {
    default_session: Option<SessionInfo>,
    init: InitBehavior,
    init_delay: Duration,
    service: Arc<MockMessagingService>,
    ready_after: u32,
    existing: Mutex<Option<SessionInfo>>,
    init_calls: AtomicU32,
    probe_calls: AtomicU32,
}

impl MockBackend {
    /// No auto-detected session, initialization succeeds, bridge ready at once
    pub fn new() -> Self {
        Self {
            default_session: None,
            init: InitBehavior::Succeed,
            init_delay: Duration::ZERO,
            service: Arc::new(MockMessagingService::new()),
            ready_after: 0,
            existing: Mutex::new(None),
            init_calls: AtomicU32::new(0),
            probe_calls: AtomicU32::new(0),
        }
    }

    /// The host already created a session from static configuration
    pub fn with_default_session(mut self) -> Self {
        self.default_session = Some(SessionInfo {
            name: DEFAULT_SESSION_NAME.to_string(),
            project_id: "pushline-host".to_string(),
        });
        self
    }

    pub fn with_init(mut self, behavior: InitBehavior) -> Self {
        self.init = behavior;
        self
    }

    /// Hold explicit initialization open, to let concurrent callers pile up
    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = delay;
        self
    }

    pub fn with_service(mut self, service: Arc<MockMessagingService>) -> Self {
        self.service = service;
        self
    }

    /// The service object only appears on probe `probes + 1`
    pub fn with_bridge_ready_after(mut self, probes: u32) -> Self {
        self.ready_after = probes;
        self
    }

    pub fn service(&self) -> &Arc<MockMessagingService> {
        &self.service
    }

    /// Explicit initialization attempts
    pub fn init_calls(&self) -> u32 {
        self.init_calls.load(Ordering::SeqCst)
    }

    /// Lookups of the messaging service
    pub fn probe_calls(&self) -> u32 {
        self.probe_calls.load(Ordering::SeqCst)
    }

    fn session_for(config: &ProviderConfig) -> SessionInfo {
        SessionInfo {
            name: DEFAULT_SESSION_NAME.to_string(),
            project_id: config.project_id.clone(),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagingBackend for MockBackend {
    async fn detect_default(&self) -> Option<SessionInfo> {
        self.default_session.clone()
    }

    async fn initialize(&self, config: &ProviderConfig) -> Result<SessionInfo, SessionError> {
        let call = self.init_calls.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(call, behavior = ?self.init, "Mock session initialization");

        if !self.init_delay.is_zero() {
            tokio::time::sleep(self.init_delay).await;
        }

        match &self.init {
            InitBehavior::Succeed => {
                let info = Self::session_for(config);
                *lock(&self.existing) = Some(info.clone());
                Ok(info)
            }
            InitBehavior::AlreadyExists => {
                *lock(&self.existing) = Some(Self::session_for(config));
                Err(SessionError::AlreadyExists)
            }
            InitBehavior::Fail(reason) => Err(SessionError::Provider {
                reason: reason.clone(),
            }),
        }
    }

    async fn existing(&self) -> Option<SessionInfo> {
        lock(&self.existing)
            .clone()
            .or_else(|| self.default_session.clone())
    }

    fn messaging_service(&self, _session: &SessionInfo) -> Option<Arc<dyn MessagingService>> {
        let probe = self.probe_calls.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        if probe <= self.ready_after {
            return None;
        }
        Some(Arc::clone(&self.service) as Arc<dyn MessagingService>)
    }
}
