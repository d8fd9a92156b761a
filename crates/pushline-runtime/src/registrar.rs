//! Process-start registration of the background handlers
//!
//! The host delivers background/killed-state messages and notification
//! interactions as soon as the process starts, possibly before any session
//! exists. [`LifecycleRegistrar::register`] creates both registration channels
//! and spawns their consumers before returning, so it must run before anything
//! that waits on messaging. Messages sent into a channel are buffered until the
//! consumer reads them and are never lost to a late registration.

use std::sync::Arc;

use pushline_core::{
    create_inbound_channel, create_interaction_channel, ChannelConfig, ForegroundPolicy,
    InboundMessage, InboundReceiver, InboundSender, InteractionReceiver, InteractionSender,
};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

use crate::handler::MessageHandler;
use crate::router::EventRouter;

// ----------------------------------------------------------------------------
// Registrar
// ----------------------------------------------------------------------------

pub struct LifecycleRegistrar {
    channels: ChannelConfig,
    handler: Arc<MessageHandler>,
    router: Arc<EventRouter>,
    policy: ForegroundPolicy,
}

impl LifecycleRegistrar {
    pub fn new(
        channels: ChannelConfig,
        handler: Arc<MessageHandler>,
        router: Arc<EventRouter>,
        policy: ForegroundPolicy,
    ) -> Self {
        Self {
            channels,
            handler,
            router,
            policy,
        }
    }

    /// Register the background message handler and the interaction handler.
    ///
    /// Must be called from within a tokio runtime.
    pub fn register(self) -> Registration {
        let (inbound_sender, inbound_receiver) = create_inbound_channel(&self.channels);
        let (interaction_sender, interaction_receiver) = create_interaction_channel(&self.channels);
        let (shutdown_sender, shutdown_receiver) = watch::channel(false);

        let background = tokio::spawn(run_background(
            inbound_receiver,
            self.handler,
            self.policy,
            shutdown_receiver.clone(),
        ));
        let interactions = tokio::spawn(run_interactions(
            interaction_receiver,
            self.router,
            shutdown_receiver,
        ));

        info!("Background message and interaction handlers registered");

        Registration {
            inbound: inbound_sender,
            interaction: interaction_sender,
            shutdown: shutdown_sender,
            background: Some(background),
            interactions: Some(interactions),
        }
    }
}

// ----------------------------------------------------------------------------
// Registration
// ----------------------------------------------------------------------------

/// Live registration points and their consumer tasks
pub struct Registration {
    inbound: InboundSender,
    interaction: InteractionSender,
    shutdown: watch::Sender<bool>,
    background: Option<JoinHandle<()>>,
    interactions: Option<JoinHandle<()>>,
}

impl Registration {
    /// Sender the push transport delivers background/killed-state messages into
    pub fn inbound_sender(&self) -> InboundSender {
        self.inbound.clone()
    }

    /// Sender the notification center delivers interactions into
    pub fn interaction_sender(&self) -> InteractionSender {
        self.interaction.clone()
    }

    pub fn is_running(&self) -> bool {
        self.background.as_ref().is_some_and(|h| !h.is_finished())
            && self.interactions.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Close both channels, let buffered work finish and join the consumers
    pub async fn shutdown(&mut self) {
        let _ = self.shutdown.send(true);

        for handle in [self.background.take(), self.interactions.take()]
            .into_iter()
            .flatten()
        {
            if let Err(err) = handle.await {
                error!(%err, "Handler task ended abnormally");
            }
        }
        info!("Background handlers stopped");
    }
}

// ----------------------------------------------------------------------------
// Consumer Loops
// ----------------------------------------------------------------------------

/// Messages are handled concurrently; no ordering between them is kept
async fn run_background(
    mut inbound: InboundReceiver,
    handler: Arc<MessageHandler>,
    policy: ForegroundPolicy,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut in_flight = JoinSet::new();
    let mut closing = false;

    loop {
        tokio::select! {
            message = inbound.recv() => match message {
                Some(InboundMessage { message, state }) => {
                    debug!(message_id = %message.message_id, %state, "Inbound message");
                    let handler = Arc::clone(&handler);
                    in_flight.spawn(async move {
                        handler.handle(&message, state, policy).await;
                    });
                }
                None => break,
            },
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(err) = joined {
                    error!(%err, "Background handler task failed");
                }
            }
            _ = shutdown.changed(), if !closing => {
                closing = true;
                inbound.close();
            }
        }
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(err) = joined {
            error!(%err, "Background handler task failed");
        }
    }
    debug!("Background message handler finished");
}

async fn run_interactions(
    mut interactions: InteractionReceiver,
    router: Arc<EventRouter>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut closing = false;

    loop {
        tokio::select! {
            event = interactions.recv() => match event {
                Some(event) => {
                    router.on_event(event);
                }
                None => break,
            },
            _ = shutdown.changed(), if !closing => {
                closing = true;
                interactions.close();
            }
        }
    }
    debug!("Interaction handler finished");
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
