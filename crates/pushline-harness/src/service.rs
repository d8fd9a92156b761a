//! Mock messaging service
//!
//! Simulates the native messaging object: which capabilities it exposes, the
//! OS permission store behind it, the registration token and the notification
//! that launched the app.

use async_trait::async_trait;
use pushline_core::{
    Capability, MessagingService, PermissionState, PipelineError, RemoteMessage, Result,
    SessionError,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};
use tracing::debug;

pub struct MockMessagingService {
    missing: HashSet<Capability>,
    status_code: AtomicI32,
    request_code: i32,
    token: Option<String>,
    initial_notification: Option<RemoteMessage>,
    fail_requests: bool,
    request_calls: AtomicU32,
}

impl MockMessagingService {
    /// Every capability exposed, permission undetermined, granted on request
    pub fn new() -> Self {
        Self {
            missing: HashSet::new(),
            status_code: AtomicI32::new(PermissionState::CODE_NOT_DETERMINED),
            request_code: PermissionState::CODE_AUTHORIZED,
            token: Some("mock-token".to_string()),
            initial_notification: None,
            fail_requests: false,
            request_calls: AtomicU32::new(0),
        }
    }

    /// Hide one capability from the readiness probe
    pub fn without(mut self, capability: Capability) -> Self {
        self.missing.insert(capability);
        self
    }

    /// Status code the OS answers a permission prompt with
    pub fn with_request_code(mut self, code: i32) -> Self {
        self.request_code = code;
        self
    }

    /// Status already stored before any prompt
    pub fn with_status_code(self, code: i32) -> Self {
        self.status_code.store(code, Ordering::SeqCst);
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_initial_notification(mut self, message: RemoteMessage) -> Self {
        self.initial_notification = Some(message);
        self
    }

    /// Make every provider call fail
    pub fn failing_requests(mut self) -> Self {
        self.fail_requests = true;
        self
    }

    /// Number of permission prompts shown
    pub fn request_calls(&self) -> u32 {
        self.request_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.fail_requests {
            return Err(PipelineError::Session(SessionError::Provider {
                reason: "native module call failed".to_string(),
            }));
        }
        Ok(())
    }
}

impl Default for MockMessagingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagingService for MockMessagingService {
    fn supports(&self, capability: Capability) -> bool {
        !self.missing.contains(&capability)
    }

    async fn request_permission(&self) -> Result<i32> {
        self.check_available()?;
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        self.status_code.store(self.request_code, Ordering::SeqCst);
        debug!(code = self.request_code, "Mock permission prompt answered");
        Ok(self.request_code)
    }

    async fn permission_status(&self) -> Result<i32> {
        self.check_available()?;
        Ok(self.status_code.load(Ordering::SeqCst))
    }

    async fn get_token(&self) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.token.clone())
    }

    async fn initial_notification(&self) -> Result<Option<RemoteMessage>> {
        self.check_available()?;
        Ok(self.initial_notification.clone())
    }
}
