//! Channel Module
//!
//! Registration points are channels rather than callbacks:
//! - `communication`: message types flowing between the host and the handlers
//! - `utils`: channel type aliases and constructors

pub mod communication;
pub mod utils;

pub use communication::{AppIntent, AppState, ForegroundEvent, InboundMessage, IntentSource};

pub use utils::{
    create_foreground_channel, create_inbound_channel, create_intent_channel,
    create_interaction_channel, ForegroundReceiver, ForegroundSender, InboundReceiver,
    InboundSender, IntentReceiver, IntentSender, InteractionReceiver, InteractionSender,
    NonBlockingSend,
};
