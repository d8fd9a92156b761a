//! Scenario replay
//!
//! A scenario describes how the simulated platform behaves (session, bridge,
//! permission store, notification center) and a list of steps the host would
//! perform. The runner drives a full pipeline through the harness
//! collaborators and reports what became visible to the user.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pushline_core::{
    AppIntent, AppState, Capability, ForegroundEvent, InboundMessage, InteractionEvent,
    IntentReceiver, NotificationId, RemoteMessage,
};
use pushline_harness::{InitBehavior, MockBackend, MockMessagingService, RecordingNotifier};
use pushline_runtime::{ForegroundSubscription, PipelineBuilder, PipelineHandle, PipelineStats};

use crate::config::AppConfig;
use crate::error::{CliError, Result};

// ----------------------------------------------------------------------------
// Scenario File Format
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    pub platform: PlatformSetup,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSetup {
    /// The host created a session from static configuration
    pub default_session: bool,
    pub init: InitOutcome,
    pub init_delay_ms: u64,
    /// Probes before the messaging service appears
    pub bridge_ready_after: u32,
    pub missing_capabilities: Vec<Capability>,
    /// Stored permission status before any prompt
    pub permission_status: i32,
    /// Status the user answers the prompt with
    pub permission_answer: i32,
    pub token: Option<String>,
    pub initial_notification: Option<RemoteMessage>,
    /// Reason the notification center refuses to display
    pub refuse_display: Option<String>,
}

impl Default for PlatformSetup {
    fn default() -> Self {
        Self {
            default_session: false,
            init: InitOutcome::Succeed,
            init_delay_ms: 0,
            bridge_ready_after: 0,
            missing_capabilities: Vec::new(),
            permission_status: -1,
            permission_answer: 1,
            token: Some("simulated-token".to_string()),
            initial_notification: None,
            refuse_display: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitOutcome {
    #[default]
    Succeed,
    AlreadyExists,
    Fail(String),
}

impl From<&InitOutcome> for InitBehavior {
    fn from(outcome: &InitOutcome) -> Self {
        match outcome {
            InitOutcome::Succeed => InitBehavior::Succeed,
            InitOutcome::AlreadyExists => InitBehavior::AlreadyExists,
            InitOutcome::Fail(reason) => InitBehavior::Fail(reason.clone()),
        }
    }
}

/// One host action
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// The transport delivers a message in the given app state
    Deliver { state: AppState, message: RemoteMessage },
    /// The user taps an OS-rendered notification while the app is backgrounded
    Opened { message: RemoteMessage },
    /// The user presses the n-th notification presented so far
    Press { index: usize },
    /// The user dismisses the n-th notification presented so far
    Dismiss { index: usize },
    /// The provider rotates the token
    TokenRefresh { token: String },
    RequestPermission,
    FetchToken,
    /// Attach the foreground listener
    Foreground,
    Sleep { ms: u64 },
}

impl Scenario {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&source)
    }

    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }
}

// ----------------------------------------------------------------------------
// Report
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PresentedNotification {
    pub notification_id: String,
    pub channel_id: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub presented: Vec<PresentedNotification>,
    pub intents: Vec<AppIntent>,
    pub permission_results: Vec<bool>,
    pub tokens: Vec<Option<String>>,
    pub latest_token: Option<String>,
    pub stats: PipelineStats,
}

// ----------------------------------------------------------------------------
// Runner
// ----------------------------------------------------------------------------

pub struct ScenarioRunner {
    config: AppConfig,
}

impl ScenarioRunner {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self, scenario: &Scenario) -> Result<ScenarioReport> {
        info!(name = %scenario.name, steps = scenario.steps.len(), "Running scenario");

        let (backend, notifier) = Self::platform(&scenario.platform);
        let mut pipeline = PipelineBuilder::new()
            .with_config(self.config.pipeline.clone())
            .with_backend(backend)
            .with_notifier(notifier.clone())
            .warm_up(self.config.simulator.warm_up)
            .build_and_start()
            .await?;
        let intent_receiver = pipeline
            .take_intent_receiver()
            .ok_or_else(|| CliError::Scenario("intent receiver already taken".to_string()))?;

        let mut run = Run {
            pipeline: &pipeline,
            notifier: &notifier,
            settle: Duration::from_millis(self.config.simulator.settle_timeout_ms),
            foreground: None,
            permission_results: Vec::new(),
            tokens: Vec::new(),
        };
        for (index, step) in scenario.steps.iter().enumerate() {
            info!(step = index, ?step, "Step");
            run.step(step).await?;
        }

        let Run {
            foreground,
            permission_results,
            tokens,
            ..
        } = run;
        if let Some(subscription) = foreground {
            subscription.unsubscribe().await;
        }
        pipeline.shutdown().await?;

        Ok(ScenarioReport {
            name: scenario.name.clone(),
            presented: notifier
                .displayed()
                .into_iter()
                .map(|d| PresentedNotification {
                    notification_id: d.notification_id.to_string(),
                    channel_id: d.channel_id,
                    title: d.title,
                    body: d.body,
                })
                .collect(),
            intents: drain(intent_receiver),
            permission_results,
            tokens,
            latest_token: pipeline.tokens().latest().await,
            stats: pipeline.stats(),
        })
    }

    fn platform(setup: &PlatformSetup) -> (Arc<MockBackend>, Arc<RecordingNotifier>) {
        let mut service = MockMessagingService::new()
            .with_status_code(setup.permission_status)
            .with_request_code(setup.permission_answer)
            .with_token(setup.token.clone());
        for capability in &setup.missing_capabilities {
            service = service.without(*capability);
        }
        if let Some(message) = &setup.initial_notification {
            service = service.with_initial_notification(message.clone());
        }

        let mut backend = MockBackend::new()
            .with_init((&setup.init).into())
            .with_init_delay(Duration::from_millis(setup.init_delay_ms))
            .with_bridge_ready_after(setup.bridge_ready_after)
            .with_service(Arc::new(service));
        if setup.default_session {
            backend = backend.with_default_session();
        }

        let mut notifier = RecordingNotifier::new();
        if let Some(reason) = &setup.refuse_display {
            notifier = notifier.refuse_display(reason.clone());
        }

        (Arc::new(backend), Arc::new(notifier))
    }
}

struct Run<'a> {
    pipeline: &'a PipelineHandle,
    notifier: &'a RecordingNotifier,
    settle: Duration,
    foreground: Option<ForegroundSubscription>,
    permission_results: Vec<bool>,
    tokens: Vec<Option<String>>,
}

impl Run<'_> {
    async fn step(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::Deliver { state, message } => self.deliver(*state, message.clone()).await,
            Step::Opened { message } => {
                self.send_foreground(ForegroundEvent::NotificationOpened(message.clone()))
                    .await
            }
            Step::TokenRefresh { token } => {
                self.send_foreground(ForegroundEvent::TokenRefreshed(token.clone()))
                    .await
            }
            Step::Press { index } => {
                let shown = self.presented(*index).await?;
                self.interact(InteractionEvent::press(shown.0, shown.1)).await
            }
            Step::Dismiss { index } => {
                let shown = self.presented(*index).await?;
                self.interact(InteractionEvent::dismiss(shown.0)).await
            }
            Step::RequestPermission => {
                let granted = self.pipeline.permissions().request_permission().await;
                self.permission_results.push(granted);
                Ok(())
            }
            Step::FetchToken => {
                let token = self.pipeline.tokens().fetch_token().await;
                self.tokens.push(token);
                Ok(())
            }
            Step::Foreground => {
                self.attach_foreground().await;
                Ok(())
            }
            Step::Sleep { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                Ok(())
            }
        }
    }

    async fn deliver(&mut self, state: AppState, message: RemoteMessage) -> Result<()> {
        if state == AppState::Foreground {
            return self.send_foreground(ForegroundEvent::Message(message)).await;
        }

        self.pipeline
            .inbound_sender()
            .send(InboundMessage { message, state })
            .await
            .map_err(|_| CliError::Scenario("inbound channel closed".to_string()))
    }

    async fn send_foreground(&mut self, event: ForegroundEvent) -> Result<()> {
        if !self.attach_foreground().await {
            warn!("Foreground listener unavailable, event dropped");
            return Ok(());
        }
        let Some(subscription) = &self.foreground else {
            return Ok(());
        };
        subscription
            .sender()
            .send(event)
            .await
            .map_err(|_| CliError::Scenario("foreground channel closed".to_string()))
    }

    async fn attach_foreground(&mut self) -> bool {
        if self.foreground.is_none() {
            self.foreground = self.pipeline.subscribe_foreground().await;
        }
        self.foreground.is_some()
    }

    async fn interact(&self, event: InteractionEvent) -> Result<()> {
        self.pipeline
            .interaction_sender()
            .send(event)
            .await
            .map_err(|_| CliError::Scenario("interaction channel closed".to_string()))
    }

    /// Wait until at least `index + 1` notifications are shown
    async fn presented(
        &self,
        index: usize,
    ) -> Result<(NotificationId, std::collections::BTreeMap<String, String>)> {
        let deadline = tokio::time::Instant::now() + self.settle;
        loop {
            if let Some(shown) = self.notifier.displayed().get(index) {
                return Ok((shown.notification_id.clone(), shown.data.clone()));
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(CliError::Scenario(format!(
                    "notification #{} was never presented",
                    index
                )));
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

fn drain(mut receiver: IntentReceiver) -> Vec<AppIntent> {
    let mut intents = Vec::new();
    while let Ok(intent) = receiver.try_recv() {
        intents.push(intent);
    }
    intents
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pushline_core::{IntentSource, PipelineConfig};

    fn runner() -> ScenarioRunner {
        ScenarioRunner::new(AppConfig {
            pipeline: PipelineConfig::testing(),
            ..AppConfig::default()
        })
    }

    #[tokio::test]
    async fn test_killed_promo_scenario() {
        let scenario = Scenario::from_json(include_str!("../scenarios/killed_promo.json")).unwrap();
        let report = runner().run(&scenario).await.unwrap();

        assert_eq!(report.presented.len(), 1);
        assert_eq!(report.presented[0].title, "Promo");
        assert_eq!(report.intents.len(), 1);
        assert_eq!(report.intents[0].route.as_deref(), Some("Promotions"));
        assert_eq!(report.intents[0].source, IntentSource::NotificationPress);
    }

    #[tokio::test]
    async fn test_misconfigured_scenario_degrades() {
        let scenario =
            Scenario::from_json(include_str!("../scenarios/session_failure.json")).unwrap();
        let report = runner().run(&scenario).await.unwrap();

        assert_eq!(report.permission_results, vec![false]);
        assert_eq!(report.tokens, vec![None]);
        assert!(report.stats.messaging_disabled);
        assert_eq!(report.presented.len(), 1);
    }

    #[tokio::test]
    async fn test_foreground_mirror_scenario() {
        let scenario =
            Scenario::from_json(include_str!("../scenarios/foreground_mirror.json")).unwrap();
        let mut runner = runner();
        runner.config.pipeline.foreground = pushline_core::ForegroundPolicy::Mirror;
        let report = runner.run(&scenario).await.unwrap();

        assert_eq!(report.presented.len(), 1);
        assert_eq!(report.stats.handler.duplicates, 1);
        assert_eq!(report.latest_token.as_deref(), Some("rotated-token"));
        assert!(report
            .intents
            .iter()
            .any(|intent| intent.source == IntentSource::InitialNotification));
    }

    #[test]
    fn test_step_format() {
        let steps: Vec<Step> = serde_json::from_str(
            r#"[
                "request_permission",
                {"sleep": {"ms": 5}},
                {"press": {"index": 0}},
                {"deliver": {"state": "killed", "message": {"messageId": "1", "data": {}}}}
            ]"#,
        )
        .unwrap();
        assert_eq!(steps.len(), 4);
        assert!(matches!(steps[0], Step::RequestPermission));
    }
}
