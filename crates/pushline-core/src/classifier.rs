//! Classification of inbound remote messages
//!
//! The same logical message can arrive as a notification-bearing payload (which
//! the OS renders itself) or as a data-only payload (which nobody renders unless
//! the pipeline synthesizes a notification). Classification decides which one it
//! is so that exactly one visible notification results.

use tracing::debug;

use crate::types::{ClassifiedIntent, RemoteMessage, Synthesis};

/// Data key carrying the title of a data-only message
pub const DATA_TITLE_KEY: &str = "title";
/// Data key carrying the body of a data-only message
pub const DATA_BODY_KEY: &str = "body";

/// Stateless classifier for remote messages
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageClassifier;

impl MessageClassifier {
    /// Decide how `message` becomes visible to the user.
    ///
    /// A message with a notification block is never synthesized again. A data-only
    /// message needs both a non-empty title and body; anything else carries no
    /// user-facing content and is dropped.
    pub fn classify(message: &RemoteMessage) -> ClassifiedIntent {
        if message.notification.is_some() {
            return ClassifiedIntent::AlreadyPresented;
        }

        match (
            message.data_value(DATA_TITLE_KEY),
            message.data_value(DATA_BODY_KEY),
        ) {
            (Some(title), Some(body)) => ClassifiedIntent::NeedsSynthesis(Synthesis {
                title: title.to_string(),
                body: body.to_string(),
                data: message.data.clone(),
            }),
            _ => {
                debug!(
                    message_id = %message.message_id,
                    keys = message.data.len(),
                    "Data-only message without title/body, nothing to present"
                );
                ClassifiedIntent::AlreadyPresented
            }
        }
    }

    /// Classification used while the UI is visible and mirroring is enabled:
    /// the notification block itself is rendered locally.
    pub fn classify_mirrored(message: &RemoteMessage) -> ClassifiedIntent {
        match &message.notification {
            Some(notification) => ClassifiedIntent::NeedsSynthesis(Synthesis {
                title: notification.title.clone(),
                body: notification.body.clone(),
                data: message.data.clone(),
            }),
            None => Self::classify(message),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
