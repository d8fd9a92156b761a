//! Pipeline Builder API
//!
//! Wires the collaborators into a running pipeline. The background handlers
//! are registered before anything touches the messaging session, then an
//! optional warm-up acquires the session in the background.

use std::sync::Arc;

use pushline_core::{
    create_intent_channel, InboundSender, IntentReceiver, InteractionSender, MessagingBackend,
    NotificationSubsystem, PipelineConfig, PipelineError, Result, SessionError,
};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::foreground::{ForegroundListener, ForegroundSubscription};
use crate::handler::{HandlerStats, MessageHandler};
use crate::messaging::MessagingAccess;
use crate::permission::PermissionManager;
use crate::presenter::Presenter;
use crate::registrar::{LifecycleRegistrar, Registration};
use crate::router::{EventRouter, RouterStats};
use crate::session::SessionHandle;
use crate::token::TokenManager;

// ----------------------------------------------------------------------------
// Pipeline Builder
// ----------------------------------------------------------------------------

pub struct PipelineBuilder {
    config: PipelineConfig,
    backend: Option<Arc<dyn MessagingBackend>>,
    notifier: Option<Arc<dyn NotificationSubsystem>>,
    warm_up: bool,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            backend: None,
            notifier: None,
            warm_up: true,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Messaging provider behind the session
    pub fn with_backend(mut self, backend: Arc<dyn MessagingBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// On-device notification center
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSubsystem>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Acquire the session and create the notification channel right after start
    pub fn warm_up(mut self, enabled: bool) -> Self {
        self.warm_up = enabled;
        self
    }

    /// Register the handlers and start the pipeline
    pub async fn build_and_start(self) -> Result<PipelineHandle> {
        let backend = self
            .backend
            .ok_or_else(|| PipelineError::config_error("no messaging backend configured"))?;
        let notifier = self
            .notifier
            .ok_or_else(|| PipelineError::config_error("no notification subsystem configured"))?;
        let config = self.config;

        info!("Starting notification pipeline");

        let presenter = Arc::new(Presenter::new(notifier));
        let handler = Arc::new(MessageHandler::new(
            Arc::clone(&presenter),
            config.notification_channel.clone(),
            config.dedup.capacity,
        ));
        let (intent_sender, intent_receiver) = create_intent_channel(&config.channels);
        let router = Arc::new(EventRouter::new(intent_sender));

        // Registration happens before the session is ever touched
        let registration = LifecycleRegistrar::new(
            config.channels.clone(),
            Arc::clone(&handler),
            Arc::clone(&router),
            config.foreground,
        )
        .register();

        let messaging = Arc::new(MessagingAccess::new(
            backend,
            config.provider.clone(),
            config.bridge.clone(),
        ));
        let permissions = Arc::new(PermissionManager::new(Arc::clone(&messaging)));
        let tokens = Arc::new(TokenManager::new(
            Arc::clone(&messaging),
            Arc::clone(&permissions),
        ));
        let foreground = ForegroundListener::new(
            Arc::clone(&messaging),
            Arc::clone(&handler),
            Arc::clone(&router),
            Arc::clone(&tokens),
            config.foreground,
            config.channels.clone(),
        );

        let warm_up = self.warm_up.then(|| {
            let messaging = Arc::clone(&messaging);
            let presenter = Arc::clone(&presenter);
            let channel = config.notification_channel.clone();
            tokio::spawn(async move {
                if let Err(err) = presenter.ensure_channel(&channel).await {
                    warn!(%err, "Notification channel setup failed during warm-up");
                }
                match messaging.ready().await {
                    Ok(_) => info!("Messaging ready"),
                    Err(err) => error!(%err, "Messaging unavailable, continuing without it"),
                }
            })
        });

        info!("Notification pipeline started");

        Ok(PipelineHandle {
            registration,
            intent_receiver: Some(intent_receiver),
            messaging,
            permissions,
            tokens,
            foreground,
            handler,
            router,
            warm_up,
            running: true,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ----------------------------------------------------------------------------
// Pipeline Handle
// ----------------------------------------------------------------------------

/// Counters of a running pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStats {
    pub handler: HandlerStats,
    pub router: RouterStats,
    pub messaging_disabled: bool,
}

/// Handle to a running pipeline
pub struct PipelineHandle {
    registration: Registration,
    intent_receiver: Option<IntentReceiver>,
    messaging: Arc<MessagingAccess>,
    permissions: Arc<PermissionManager>,
    tokens: Arc<TokenManager>,
    foreground: ForegroundListener,
    handler: Arc<MessageHandler>,
    router: Arc<EventRouter>,
    warm_up: Option<JoinHandle<()>>,
    running: bool,
}

impl PipelineHandle {
    /// Background/killed-state registration point
    pub fn inbound_sender(&self) -> InboundSender {
        self.registration.inbound_sender()
    }

    /// Notification center registration point
    pub fn interaction_sender(&self) -> InteractionSender {
        self.registration.interaction_sender()
    }

    /// Take the routed intent receiver (can only be called once)
    pub fn take_intent_receiver(&mut self) -> Option<IntentReceiver> {
        self.intent_receiver.take()
    }

    pub fn messaging(&self) -> &Arc<MessagingAccess> {
        &self.messaging
    }

    /// Acquire the process-wide messaging session
    pub async fn acquire_session(&self) -> core::result::Result<SessionHandle, SessionError> {
        self.messaging.acquire_session().await
    }

    pub fn permissions(&self) -> &Arc<PermissionManager> {
        &self.permissions
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Attach the foreground listener once messaging is ready
    pub async fn subscribe_foreground(&self) -> Option<ForegroundSubscription> {
        self.foreground.subscribe().await
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            handler: self.handler.stats(),
            router: self.router.stats(),
            messaging_disabled: self.messaging.is_disabled(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running && self.registration.is_running()
    }

    /// Stop the handlers after the work already queued is done
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Shutting down notification pipeline");

        if let Some(warm_up) = self.warm_up.take() {
            warm_up.abort();
        }
        self.registration.shutdown().await;

        self.running = false;
        info!("Notification pipeline shut down");
        Ok(())
    }
}
