//! Pushline Core
//!
//! Foundational types for the pushline notification pipeline: the inbound message
//! model, classification of remote messages, the error taxonomy, configuration, the
//! channel schema used between registration points and handlers, and the contracts
//! of the external collaborators (push transport, OS notification center, host app).
//!
//! Nothing in this crate spawns tasks or talks to a platform; `pushline-runtime`
//! wires these pieces together.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod channel;
pub mod classifier;
pub mod config;
pub mod dedup;
pub mod errors;
pub mod provider;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use channel::{
    create_foreground_channel, create_inbound_channel, create_intent_channel,
    create_interaction_channel, AppIntent, AppState, ForegroundEvent, ForegroundReceiver,
    ForegroundSender, InboundMessage, InboundReceiver, InboundSender, IntentReceiver,
    IntentSender, IntentSource, InteractionReceiver, InteractionSender, NonBlockingSend,
};
pub use classifier::MessageClassifier;
pub use config::{
    BridgeConfig, ChannelConfig, DedupConfig, ForegroundPolicy, PipelineConfig, ProviderConfig,
};
pub use dedup::{DeliveryLedger, LedgerStats};
pub use errors::{
    BridgeUnavailable, ChannelError, PipelineError, PresentationError, Result, SessionError,
};
pub use provider::{
    Capability, DisplayRequest, MessagingBackend, MessagingService,
    NotificationSubsystem, SessionInfo,
};
pub use types::{
    ClassifiedIntent, Importance, InteractionEvent, InteractionKind, MessageId,
    NotificationChannel, NotificationId, NotificationPayload, PermissionState, RemoteMessage,
    Synthesis, Timestamp, DEFAULT_ACTION_ID,
};
