//! Foreground listener
//!
//! Unlike the background handler, the foreground listener is only attached once
//! the messaging service is ready. Attaching it also routes the notification
//! that launched the app from the killed state, once per process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pushline_core::{
    create_foreground_channel, AppState, ChannelConfig, ForegroundEvent, ForegroundPolicy,
    ForegroundReceiver, ForegroundSender, IntentSource,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::handler::MessageHandler;
use crate::messaging::MessagingAccess;
use crate::router::EventRouter;
use crate::token::TokenManager;

pub struct ForegroundListener {
    messaging: Arc<MessagingAccess>,
    handler: Arc<MessageHandler>,
    router: Arc<EventRouter>,
    tokens: Arc<TokenManager>,
    policy: ForegroundPolicy,
    channels: ChannelConfig,
    initial_checked: AtomicBool,
}

impl ForegroundListener {
    pub fn new(
        messaging: Arc<MessagingAccess>,
        handler: Arc<MessageHandler>,
        router: Arc<EventRouter>,
        tokens: Arc<TokenManager>,
        policy: ForegroundPolicy,
        channels: ChannelConfig,
    ) -> Self {
        Self {
            messaging,
            handler,
            router,
            tokens,
            policy,
            channels,
            initial_checked: AtomicBool::new(false),
        }
    }

    /// Attach a foreground listener; `None` while messaging is disabled
    pub async fn subscribe(&self) -> Option<ForegroundSubscription> {
        let Some(service) = self.messaging.service().await else {
            warn!("Messaging not available, foreground listener not attached");
            return None;
        };

        if !self.initial_checked.swap(true, Ordering::SeqCst) {
            match service.initial_notification().await {
                Ok(Some(message)) => {
                    info!(message_id = %message.message_id, "App launched from notification");
                    self.router
                        .on_notification_opened(&message, IntentSource::InitialNotification);
                }
                Ok(None) => debug!("No initial notification"),
                Err(err) => warn!(%err, "Could not read initial notification"),
            }
        }

        let (sender, receiver) = create_foreground_channel(&self.channels);
        let (stop_sender, stop_receiver) = oneshot::channel();
        let task = tokio::spawn(run_foreground(
            receiver,
            stop_receiver,
            Arc::clone(&self.handler),
            Arc::clone(&self.router),
            Arc::clone(&self.tokens),
            self.policy,
        ));

        info!(policy = ?self.policy, "Foreground listener attached");
        Some(ForegroundSubscription {
            sender,
            stop: Some(stop_sender),
            task: Some(task),
        })
    }
}

/// Attached foreground listener. Dropping it detaches the listener too.
pub struct ForegroundSubscription {
    sender: ForegroundSender,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ForegroundSubscription {
    /// Sender the push transport delivers foreground events into
    pub fn sender(&self) -> ForegroundSender {
        self.sender.clone()
    }

    /// Detach the listener and wait for queued events to be handled
    pub async fn unsubscribe(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                error!(%err, "Foreground listener ended abnormally");
            }
        }
        info!("Foreground listener detached");
    }
}

async fn run_foreground(
    mut events: ForegroundReceiver,
    mut stop: oneshot::Receiver<()>,
    handler: Arc<MessageHandler>,
    router: Arc<EventRouter>,
    tokens: Arc<TokenManager>,
    policy: ForegroundPolicy,
) {
    let mut closing = false;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ForegroundEvent::Message(message)) => {
                    handler.handle(&message, AppState::Foreground, policy).await;
                }
                Some(ForegroundEvent::NotificationOpened(message)) => {
                    router.on_notification_opened(&message, IntentSource::NotificationOpened);
                }
                Some(ForegroundEvent::TokenRefreshed(token)) => {
                    tokens.record_refresh(token).await;
                }
                None => break,
            },
            _ = &mut stop, if !closing => {
                closing = true;
                events.close();
            }
        }
    }
    debug!("Foreground listener finished");
}
