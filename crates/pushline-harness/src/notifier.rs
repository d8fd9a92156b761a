//! Recording notification center

use async_trait::async_trait;
use pushline_core::{
    DisplayRequest, NotificationChannel, NotificationId, NotificationSubsystem, PresentationError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

use crate::lock;

/// How the notification center answers a display request
#[derive(Debug, Clone, Default)]
enum DisplayMode {
    #[default]
    Show,
    Refuse(String),
    NoPermission,
}

/// Keeps every channel and notification it is asked to create
#[derive(Default)]
pub struct RecordingNotifier {
    display: DisplayMode,
    create_delay: Duration,
    refused_channels: AtomicUsize,
    create_calls: AtomicUsize,
    channels: Mutex<Vec<NotificationChannel>>,
    displayed: Mutex<Vec<DisplayRequest>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every display with `reason`
    pub fn refuse_display(mut self, reason: impl Into<String>) -> Self {
        self.display = DisplayMode::Refuse(reason.into());
        self
    }

    /// Refuse every display as the OS does when notifications are not permitted
    pub fn without_permission(mut self) -> Self {
        self.display = DisplayMode::NoPermission;
        self
    }

    /// Take `delay` to create a channel, as the platform call does
    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    /// Fail the first `count` channel creations
    pub fn refuse_channels(self, count: usize) -> Self {
        self.refused_channels.store(count, Ordering::SeqCst);
        self
    }

    pub fn displayed(&self) -> Vec<DisplayRequest> {
        lock(&self.displayed).clone()
    }

    /// Channels created successfully, in order
    pub fn created_channels(&self) -> Vec<NotificationChannel> {
        lock(&self.channels).clone()
    }

    /// Channel creation attempts, failed ones included
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationSubsystem for RecordingNotifier {
    async fn create_channel(&self, channel: &NotificationChannel) -> Result<(), PresentationError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }

        let refused = self
            .refused_channels
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if refused {
            return Err(PresentationError::ChannelSetup {
                channel_id: channel.id.clone(),
                reason: "channel service unavailable".to_string(),
            });
        }

        lock(&self.channels).push(channel.clone());
        Ok(())
    }

    async fn display(&self, request: DisplayRequest) -> Result<NotificationId, PresentationError> {
        match &self.display {
            DisplayMode::Show => {}
            DisplayMode::Refuse(reason) => {
                return Err(PresentationError::Refused {
                    reason: reason.clone(),
                })
            }
            DisplayMode::NoPermission => return Err(PresentationError::PermissionMissing),
        }

        info!(
            notification_id = %request.notification_id,
            channel = %request.channel_id,
            title = %request.title,
            "Notification shown"
        );
        let id = request.notification_id.clone();
        lock(&self.displayed).push(request);
        Ok(id)
    }
}
