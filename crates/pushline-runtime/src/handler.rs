//! Inbound message handling
//!
//! Shared body of the background/killed-state handler and the foreground
//! listener: classify, dedup by message id, present at most once. Nothing in
//! here depends on the messaging session, so the handler keeps working when
//! messaging is disabled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use pushline_core::{
    AppState, ClassifiedIntent, DeliveryLedger, ForegroundPolicy, LedgerStats, MessageClassifier,
    NotificationChannel, NotificationId, PresentationError, RemoteMessage,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::presenter::Presenter;

/// What happened to one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    Presented(NotificationId),
    /// Rendered elsewhere, or nothing to render
    NotPresented,
    /// Same message id already handled in this process
    Duplicate,
    /// Presentation failed; the message is dropped
    Failed(PresentationError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlerStats {
    pub received: u64,
    pub presented: u64,
    pub not_presented: u64,
    pub duplicates: u64,
    pub failed: u64,
    pub ledger: LedgerStats,
}

pub struct MessageHandler {
    presenter: Arc<Presenter>,
    channel: NotificationChannel,
    ledger: Mutex<DeliveryLedger>,
    received: AtomicU64,
    presented: AtomicU64,
    not_presented: AtomicU64,
    duplicates: AtomicU64,
    failed: AtomicU64,
}

impl MessageHandler {
    pub fn new(presenter: Arc<Presenter>, channel: NotificationChannel, dedup_capacity: usize) -> Self {
        Self {
            presenter,
            channel,
            ledger: Mutex::new(DeliveryLedger::new(dedup_capacity)),
            received: AtomicU64::new(0),
            presented: AtomicU64::new(0),
            not_presented: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Handle one message delivered while the app was in `state`
    pub async fn handle(
        &self,
        message: &RemoteMessage,
        state: AppState,
        policy: ForegroundPolicy,
    ) -> HandleOutcome {
        self.received.fetch_add(1, Ordering::Relaxed);

        let intent = match (state, policy) {
            (AppState::Foreground, ForegroundPolicy::Mirror) => {
                MessageClassifier::classify_mirrored(message)
            }
            _ => MessageClassifier::classify(message),
        };

        let synthesis = match intent {
            ClassifiedIntent::NeedsSynthesis(synthesis) => synthesis,
            ClassifiedIntent::AlreadyPresented => {
                debug!(message_id = %message.message_id, %state, "Nothing to present");
                self.not_presented.fetch_add(1, Ordering::Relaxed);
                return HandleOutcome::NotPresented;
            }
        };

        let first_delivery = self.ledger().check_and_add(&message.message_id);
        if !first_delivery {
            debug!(message_id = %message.message_id, %state, "Duplicate message, skipping");
            self.duplicates.fetch_add(1, Ordering::Relaxed);
            return HandleOutcome::Duplicate;
        }

        match self.presenter.present(&synthesis, &self.channel).await {
            Ok(id) => {
                info!(
                    message_id = %message.message_id,
                    notification_id = %id,
                    %state,
                    "Notification presented"
                );
                self.presented.fetch_add(1, Ordering::Relaxed);
                HandleOutcome::Presented(id)
            }
            Err(err) => {
                error!(message_id = %message.message_id, %state, %err, "Failed to present notification");
                self.failed.fetch_add(1, Ordering::Relaxed);
                HandleOutcome::Failed(err)
            }
        }
    }

    pub fn stats(&self) -> HandlerStats {
        HandlerStats {
            received: self.received.load(Ordering::Relaxed),
            presented: self.presented.load(Ordering::Relaxed),
            not_presented: self.not_presented.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            ledger: self.ledger().stats().clone(),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, DeliveryLedger> {
        self.ledger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
