//! Interaction routing
//!
//! Turns notification interactions into [`AppIntent`]s for the host application.
//! The router never touches UI state; it only queues intents, so it works the
//! same whether or not a UI is mounted.

use std::sync::atomic::{AtomicU64, Ordering};

use pushline_core::{
    AppIntent, ChannelError, IntentSender, IntentSource, InteractionEvent, InteractionKind,
    NonBlockingSend, RemoteMessage, DEFAULT_ACTION_ID,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What happened to one interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// An intent was queued for the host application
    Dispatched(AppIntent),
    /// Acknowledged, nothing to route
    Ignored,
    /// An intent was derived but could not be queued
    Dropped(ChannelError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterStats {
    pub dispatched: u64,
    pub ignored: u64,
    pub dropped: u64,
}

pub struct EventRouter {
    intents: IntentSender,
    dispatched: AtomicU64,
    ignored: AtomicU64,
    dropped: AtomicU64,
}

impl EventRouter {
    pub fn new(intents: IntentSender) -> Self {
        Self {
            intents,
            dispatched: AtomicU64::new(0),
            ignored: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Route one notification center interaction
    pub fn on_event(&self, event: InteractionEvent) -> RouteOutcome {
        match event.kind {
            InteractionKind::Press if event.action_id == DEFAULT_ACTION_ID => {
                debug!(notification_id = %event.notification_id, "Notification pressed");
                self.dispatch(AppIntent::from_payload(
                    &event.payload,
                    IntentSource::NotificationPress,
                ))
            }
            kind => {
                debug!(
                    notification_id = %event.notification_id,
                    ?kind,
                    action = %event.action_id,
                    "Interaction acknowledged, nothing to route"
                );
                self.ignored.fetch_add(1, Ordering::Relaxed);
                RouteOutcome::Ignored
            }
        }
    }

    /// Route a message whose notification opened the app
    pub fn on_notification_opened(&self, message: &RemoteMessage, source: IntentSource) -> RouteOutcome {
        debug!(message_id = %message.message_id, ?source, "App opened from notification");
        self.dispatch(AppIntent::from_payload(&message.data, source))
    }

    pub fn stats(&self) -> RouterStats {
        RouterStats {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    fn dispatch(&self, intent: AppIntent) -> RouteOutcome {
        match self.intents.try_send_non_blocking(intent.clone()) {
            Ok(()) => {
                info!(route = ?intent.route, source = ?intent.source, "Intent queued");
                self.dispatched.fetch_add(1, Ordering::Relaxed);
                RouteOutcome::Dispatched(intent)
            }
            Err(err) => {
                warn!(%err, route = ?intent.route, "Dropping intent");
                self.dropped.fetch_add(1, Ordering::Relaxed);
                RouteOutcome::Dropped(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pushline_core::{create_intent_channel, ChannelConfig, NotificationId};
    use std::collections::BTreeMap;

    fn payload(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_press_queues_intent() {
        let (sender, mut receiver) = create_intent_channel(&ChannelConfig::testing());
        let router = EventRouter::new(sender);

        let event = InteractionEvent::press(
            NotificationId::new("n-1"),
            payload(&[("route", "Bills"), ("billId", "7")]),
        );
        assert!(matches!(router.on_event(event), RouteOutcome::Dispatched(_)));

        let intent = receiver.recv().await.unwrap();
        assert_eq!(intent.route.as_deref(), Some("Bills"));
        assert_eq!(intent.params, payload(&[("billId", "7")]));
        assert_eq!(intent.source, IntentSource::NotificationPress);
    }

    #[test]
    fn test_dismiss_and_unknown_action_are_ignored() {
        let (sender, mut receiver) = create_intent_channel(&ChannelConfig::testing());
        let router = EventRouter::new(sender);

        assert_eq!(
            router.on_event(InteractionEvent::dismiss(NotificationId::new("n-1"))),
            RouteOutcome::Ignored
        );

        let mut custom = InteractionEvent::press(NotificationId::new("n-2"), BTreeMap::new());
        custom.action_id = "reply".to_string();
        assert_eq!(router.on_event(custom), RouteOutcome::Ignored);

        assert!(receiver.try_recv().is_err());
        assert_eq!(router.stats().ignored, 2);
    }

    #[test]
    fn test_full_intent_queue_drops() {
        let mut config = ChannelConfig::testing();
        config.intent_buffer_size = 1;
        let (sender, _receiver) = create_intent_channel(&config);
        let router = EventRouter::new(sender);

        let press = || InteractionEvent::press(NotificationId::new("n"), BTreeMap::new());
        assert!(matches!(router.on_event(press()), RouteOutcome::Dispatched(_)));
        assert_eq!(
            router.on_event(press()),
            RouteOutcome::Dropped(ChannelError::ChannelFull)
        );
        assert_eq!(router.stats(), RouterStats { dispatched: 1, ignored: 0, dropped: 1 });
    }

    #[tokio::test]
    async fn test_opened_message_routes_with_source() {
        let (sender, mut receiver) = create_intent_channel(&ChannelConfig::testing());
        let router = EventRouter::new(sender);

        let message = RemoteMessage::with_notification("m-1", "Hi", "there").with_data("screen", "Inbox");
        router.on_notification_opened(&message, IntentSource::InitialNotification);

        let intent = receiver.recv().await.unwrap();
        assert_eq!(intent.route.as_deref(), Some("Inbox"));
        assert_eq!(intent.source, IntentSource::InitialNotification);
    }
}
