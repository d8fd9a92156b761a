//! Pushline Runtime
//!
//! This crate runs the notification pipeline on top of `pushline-core`:
//! - `SessionInitializer` and `BridgeReadinessGate`: lazily acquired, process-wide messaging
//! - `PermissionManager` and `TokenManager`: capability checks gated on messaging
//! - `Presenter`, `MessageHandler` and `EventRouter`: inbound messages in, notifications and intents out
//! - `LifecycleRegistrar`: registration of the background handlers at process start
//!
//! `PipelineBuilder` wires all of it together and hands back a `PipelineHandle`.

pub mod bridge;
pub mod builder;
pub mod foreground;
pub mod handler;
pub mod messaging;
pub mod permission;
pub mod presenter;
pub mod registrar;
pub mod router;
pub mod session;
pub mod token;

pub use bridge::BridgeReadinessGate;
pub use builder::{PipelineBuilder, PipelineHandle, PipelineStats};
pub use foreground::{ForegroundListener, ForegroundSubscription};
pub use handler::{HandleOutcome, HandlerStats, MessageHandler};
pub use messaging::MessagingAccess;
pub use permission::PermissionManager;
pub use presenter::Presenter;
pub use registrar::{LifecycleRegistrar, Registration};
pub use router::{EventRouter, RouteOutcome, RouterStats};
pub use session::{SessionHandle, SessionInitializer, SessionOrigin};
pub use token::TokenManager;

// Re-export core types for convenience
pub use pushline_core::{
    AppIntent, AppState, ForegroundEvent, InboundMessage, IntentReceiver, IntentSource,
    InteractionEvent, PipelineConfig, PipelineError, RemoteMessage, Result,
};
