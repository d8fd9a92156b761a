//! Channel Utilities
//!
//! Type aliases and constructors for the registration channels. Host callbacks
//! usually run on a thread the pipeline does not own, so they enqueue through
//! [`NonBlockingSend`] instead of awaiting.

use crate::channel::communication::{AppIntent, ForegroundEvent, InboundMessage};
use crate::config::ChannelConfig;
use crate::errors::ChannelError;
use crate::types::InteractionEvent;

pub type InboundSender = tokio::sync::mpsc::Sender<InboundMessage>;
pub type InboundReceiver = tokio::sync::mpsc::Receiver<InboundMessage>;
pub type InteractionSender = tokio::sync::mpsc::Sender<InteractionEvent>;
pub type InteractionReceiver = tokio::sync::mpsc::Receiver<InteractionEvent>;
pub type ForegroundSender = tokio::sync::mpsc::Sender<ForegroundEvent>;
pub type ForegroundReceiver = tokio::sync::mpsc::Receiver<ForegroundEvent>;
pub type IntentSender = tokio::sync::mpsc::Sender<AppIntent>;
pub type IntentReceiver = tokio::sync::mpsc::Receiver<AppIntent>;

// ----------------------------------------------------------------------------
// Channel Creation Utilities
// ----------------------------------------------------------------------------

/// Create bounded inbound channel (transport → background handler)
pub fn create_inbound_channel(config: &ChannelConfig) -> (InboundSender, InboundReceiver) {
    tokio::sync::mpsc::channel(config.inbound_buffer_size.max(1))
}

/// Create bounded interaction channel (notification center → router)
pub fn create_interaction_channel(
    config: &ChannelConfig,
) -> (InteractionSender, InteractionReceiver) {
    tokio::sync::mpsc::channel(config.interaction_buffer_size.max(1))
}

/// Create bounded foreground channel (transport → foreground listener)
pub fn create_foreground_channel(config: &ChannelConfig) -> (ForegroundSender, ForegroundReceiver) {
    tokio::sync::mpsc::channel(config.foreground_buffer_size.max(1))
}

/// Create bounded intent channel (router → host application)
pub fn create_intent_channel(config: &ChannelConfig) -> (IntentSender, IntentReceiver) {
    tokio::sync::mpsc::channel(config.intent_buffer_size.max(1))
}

// ----------------------------------------------------------------------------
// Non-blocking Send Utilities
// ----------------------------------------------------------------------------

/// Non-blocking send for host callbacks
pub trait NonBlockingSend<T> {
    fn try_send_non_blocking(&self, message: T) -> Result<(), ChannelError>;
}

impl<T> NonBlockingSend<T> for tokio::sync::mpsc::Sender<T> {
    fn try_send_non_blocking(&self, message: T) -> Result<(), ChannelError> {
        self.try_send(message).map_err(ChannelError::from)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
