//! Messaging session acquisition
//!
//! Exactly one session handle exists per process. The first caller of
//! [`SessionInitializer::acquire`] runs the initialization; concurrent callers
//! await that same in-flight initialization and observe its result. A failed
//! acquisition is remembered too, so messaging stays disabled instead of being
//! retried on every call.

use std::fmt;
use std::sync::Arc;

use pushline_core::{MessagingBackend, ProviderConfig, SessionError, SessionInfo};
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

// ----------------------------------------------------------------------------
// Session Handle
// ----------------------------------------------------------------------------

/// How the process-wide session came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    /// The host created it from static configuration before we looked
    Detected,
    /// Created from the embedded provider record
    Initialized,
    /// Explicit creation raced with another one; the existing session was reused
    Reused,
}

struct SessionInner {
    info: SessionInfo,
    origin: SessionOrigin,
}

/// Opaque capability meaning "messaging is ready to use".
///
/// Clones share the same underlying session; equality is identity.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

impl SessionHandle {
    fn new(info: SessionInfo, origin: SessionOrigin) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                info,
                origin,
            }),
        }
    }

    pub fn info(&self) -> &SessionInfo {
        &self.inner.info
    }

    pub fn origin(&self) -> SessionOrigin {
        self.inner.origin
    }

    /// Whether both handles refer to the same session
    pub fn ptr_eq(&self, other: &SessionHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for SessionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for SessionHandle {}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("name", &self.inner.info.name)
            .field("project_id", &self.inner.info.project_id)
            .field("origin", &self.inner.origin)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Session Initializer
// ----------------------------------------------------------------------------

/// Lazily constructed owner of the process-wide session
pub struct SessionInitializer {
    backend: Arc<dyn MessagingBackend>,
    provider: ProviderConfig,
    session: OnceCell<Result<SessionHandle, SessionError>>,
}

impl SessionInitializer {
    pub fn new(backend: Arc<dyn MessagingBackend>, provider: ProviderConfig) -> Self {
        Self {
            backend,
            provider,
            session: OnceCell::new(),
        }
    }

    /// Return the session, creating it on first use.
    ///
    /// Safe to call concurrently; only one initialization ever runs.
    pub async fn acquire(&self) -> Result<SessionHandle, SessionError> {
        self.session
            .get_or_init(|| self.initialize())
            .await
            .clone()
    }

    /// Session if one was already acquired, without initializing
    pub fn current(&self) -> Option<SessionHandle> {
        self.session
            .get()
            .and_then(|result| result.as_ref().ok())
            .cloned()
    }

    /// Whether acquisition already ran and failed
    pub fn is_disabled(&self) -> bool {
        matches!(self.session.get(), Some(Err(_)))
    }

    async fn initialize(&self) -> Result<SessionHandle, SessionError> {
        if let Some(info) = self.backend.detect_default().await {
            info!(app = %info.name, project = %info.project_id, "Messaging session detected");
            return Ok(SessionHandle::new(info, SessionOrigin::Detected));
        }

        info!("No messaging session detected, initializing from embedded configuration");
        if let Err(err) = self.provider.validate() {
            error!(%err, "Embedded provider configuration rejected");
            return Err(err);
        }

        match self.backend.initialize(&self.provider).await {
            Ok(info) => {
                info!(app = %info.name, project = %info.project_id, "Messaging session initialized");
                Ok(SessionHandle::new(info, SessionOrigin::Initialized))
            }
            Err(SessionError::AlreadyExists) => match self.backend.existing().await {
                Some(info) => {
                    info!(app = %info.name, "Messaging session already exists, reusing it");
                    Ok(SessionHandle::new(info, SessionOrigin::Reused))
                }
                None => {
                    warn!("Provider reported an existing session but none could be fetched");
                    Err(SessionError::Provider {
                        reason: "existing session reported but not found".into(),
                    })
                }
            },
            Err(err) => {
                error!(%err, "Messaging session initialization failed");
                Err(err)
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
