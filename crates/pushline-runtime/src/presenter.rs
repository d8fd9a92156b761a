//! Local notification rendering
//!
//! The presenter is the only writer of notification channels. Channels are
//! created on first use; a re-create with identical parameters never reaches
//! the OS. One render call per synthesis, no retries.

use std::sync::Arc;

use dashmap::DashMap;
use pushline_core::{
    DisplayRequest, NotificationChannel, NotificationId, NotificationSubsystem, PresentationError,
    Synthesis, DEFAULT_ACTION_ID,
};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// One channel id and the creation of its current parameters
struct ChannelSlot {
    channel: NotificationChannel,
    created: OnceCell<()>,
}

impl ChannelSlot {
    fn new(channel: &NotificationChannel) -> Arc<Self> {
        Arc::new(Self {
            channel: channel.clone(),
            created: OnceCell::new(),
        })
    }
}

pub struct Presenter {
    notifier: Arc<dyn NotificationSubsystem>,
    channels: DashMap<String, Arc<ChannelSlot>>,
}

impl Presenter {
    pub fn new(notifier: Arc<dyn NotificationSubsystem>) -> Self {
        Self {
            notifier,
            channels: DashMap::new(),
        }
    }

    /// Create `channel` unless an identical one was already created.
    ///
    /// Concurrent first users of a channel await a single creation. A failed
    /// creation is not remembered; the next user tries again.
    pub async fn ensure_channel(&self, channel: &NotificationChannel) -> Result<(), PresentationError> {
        let slot = {
            let mut entry = self
                .channels
                .entry(channel.id.clone())
                .or_insert_with(|| ChannelSlot::new(channel));
            if entry.channel != *channel {
                *entry = ChannelSlot::new(channel);
            }
            Arc::clone(entry.value())
        };

        if slot.created.initialized() {
            debug!(channel = %channel.id, "Notification channel already created");
            return Ok(());
        }

        slot.created
            .get_or_try_init(|| self.create(channel))
            .await
            .map(|_| ())
    }

    async fn create(&self, channel: &NotificationChannel) -> Result<(), PresentationError> {
        if let Err(err) = self.notifier.create_channel(channel).await {
            warn!(channel = %channel.id, %err, "Failed to create notification channel");
            return Err(match err {
                PresentationError::ChannelSetup { .. } => err,
                other => PresentationError::ChannelSetup {
                    channel_id: channel.id.clone(),
                    reason: other.to_string(),
                },
            });
        }

        info!(channel = %channel.id, sound = channel.sound_enabled, "Notification channel ready");
        Ok(())
    }

    /// Render one notification for `synthesis` on `channel`
    pub async fn present(
        &self,
        synthesis: &Synthesis,
        channel: &NotificationChannel,
    ) -> Result<NotificationId, PresentationError> {
        self.ensure_channel(channel).await?;

        let request = DisplayRequest {
            notification_id: NotificationId::generate(),
            channel_id: channel.id.clone(),
            title: synthesis.title.clone(),
            body: synthesis.body.clone(),
            data: synthesis.data.clone(),
            sound: channel.sound_enabled,
            press_action_id: DEFAULT_ACTION_ID.to_string(),
        };

        let id = self.notifier.display(request).await?;
        debug!(notification_id = %id, channel = %channel.id, "Notification displayed");
        Ok(id)
    }

    /// Number of channel ids created so far
    pub fn channel_count(&self) -> usize {
        self.channels
            .iter()
            .filter(|slot| slot.created.initialized())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use pushline_harness::RecordingNotifier;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn synthesis(title: &str) -> Synthesis {
        let mut data = BTreeMap::new();
        data.insert("title".to_string(), title.to_string());
        data.insert("body".to_string(), "body".to_string());
        data.insert("route".to_string(), "Promo".to_string());
        Synthesis {
            title: title.to_string(),
            body: "body".to_string(),
            data,
        }
    }

    #[tokio::test]
    async fn test_identical_channel_created_once() {
        let notifier = Arc::new(RecordingNotifier::new());
        let presenter = Presenter::new(notifier.clone());
        let channel = NotificationChannel::default();

        tokio_test::assert_ok!(presenter.ensure_channel(&channel).await);
        tokio_test::assert_ok!(presenter.ensure_channel(&channel).await);
        tokio_test::assert_ok!(presenter.present(&synthesis("Promo"), &channel).await);

        assert_eq!(notifier.create_calls(), 1);
        assert_eq!(presenter.channel_count(), 1);
    }

    #[tokio::test]
    async fn test_changed_channel_is_forwarded() {
        let notifier = Arc::new(RecordingNotifier::new());
        let presenter = Presenter::new(notifier.clone());

        presenter
            .ensure_channel(&NotificationChannel::default())
            .await
            .unwrap();
        presenter
            .ensure_channel(&NotificationChannel::new("default", "Default Channel", false))
            .await
            .unwrap();

        assert_eq!(notifier.create_calls(), 2);
        assert_eq!(presenter.channel_count(), 1);
    }

    #[tokio::test]
    async fn test_present_attaches_data_and_channel_sound() {
        let notifier = Arc::new(RecordingNotifier::new());
        let presenter = Presenter::new(notifier.clone());
        let channel = NotificationChannel::new("alerts", "Alerts", false);

        let id = presenter.present(&synthesis("Promo"), &channel).await.unwrap();

        let displayed = notifier.displayed();
        assert_eq!(displayed.len(), 1);
        assert_eq!(displayed[0].notification_id, id);
        assert_eq!(displayed[0].title, "Promo");
        assert_eq!(displayed[0].channel_id, "alerts");
        assert!(!displayed[0].sound);
        assert_eq!(displayed[0].data.get("route").map(String::as_str), Some("Promo"));
        assert_eq!(displayed[0].press_action_id, DEFAULT_ACTION_ID);
    }

    #[tokio::test]
    async fn test_refused_display_is_reported() {
        let notifier = Arc::new(RecordingNotifier::new().refuse_display("permission missing"));
        let presenter = Presenter::new(notifier.clone());

        let err = presenter
            .present(&synthesis("Promo"), &NotificationChannel::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PresentationError::Refused { .. }));
        assert!(notifier.displayed().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_use_creates_channel_once() {
        let notifier = Arc::new(RecordingNotifier::new().with_create_delay(Duration::from_millis(20)));
        let presenter = Arc::new(Presenter::new(notifier.clone()));
        let channel = NotificationChannel::default();

        let results = join_all((0..8).map(|i| {
            let presenter = Arc::clone(&presenter);
            let channel = channel.clone();
            tokio::spawn(async move {
                presenter
                    .present(&synthesis(&format!("Promo {}", i)), &channel)
                    .await
            })
        }))
        .await;

        for result in results {
            assert!(result.unwrap().is_ok());
        }
        assert_eq!(notifier.displayed().len(), 8);
        assert_eq!(notifier.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_channel_creation_is_retried() {
        let notifier = Arc::new(RecordingNotifier::new().refuse_channels(1));
        let presenter = Presenter::new(notifier.clone());
        let channel = NotificationChannel::default();

        let err = presenter.ensure_channel(&channel).await.unwrap_err();
        assert!(matches!(err, PresentationError::ChannelSetup { .. }));

        assert_eq!(presenter.channel_count(), 0);

        tokio_test::assert_ok!(presenter.ensure_channel(&channel).await);
        tokio_test::assert_ok!(presenter.ensure_channel(&channel).await);
        assert_eq!(notifier.create_calls(), 2);
        assert_eq!(presenter.channel_count(), 1);
    }
}
