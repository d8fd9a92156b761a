//! End-to-end pipeline scenarios driven through the harness collaborators

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use pushline_core::{
    ForegroundPolicy, InboundMessage, InteractionEvent, NotificationId, PipelineConfig,
    RemoteMessage,
};
use pushline_harness::{InitBehavior, MockBackend, MockMessagingService, RecordingNotifier};
use pushline_runtime::{
    ForegroundEvent, IntentSource, PipelineBuilder, PipelineHandle, SessionInitializer,
};

async fn start(
    backend: Arc<MockBackend>,
    notifier: Arc<RecordingNotifier>,
    config: PipelineConfig,
) -> PipelineHandle {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    PipelineBuilder::new()
        .with_config(config)
        .with_backend(backend)
        .with_notifier(notifier)
        .warm_up(false)
        .build_and_start()
        .await
        .expect("Failed to start pipeline")
}

fn promo(id: &str) -> RemoteMessage {
    RemoteMessage::data_only(id, [("title", "Promo"), ("body", "50% off")])
}

#[tokio::test]
async fn killed_state_data_message_presents_one_notification() {
    let notifier = Arc::new(RecordingNotifier::new());
    let mut pipeline = start(
        Arc::new(MockBackend::new()),
        notifier.clone(),
        PipelineConfig::testing(),
    )
    .await;

    pipeline
        .inbound_sender()
        .send(InboundMessage::killed(promo("m-1")))
        .await
        .unwrap();
    pipeline.shutdown().await.unwrap();

    let displayed = notifier.displayed();
    assert_eq!(displayed.len(), 1);
    assert_eq!(displayed[0].title, "Promo");
    assert_eq!(displayed[0].body, "50% off");
}

#[tokio::test]
async fn rapid_messages_are_presented_independently() {
    let notifier = Arc::new(RecordingNotifier::new());
    let mut pipeline = start(
        Arc::new(MockBackend::new()),
        notifier.clone(),
        PipelineConfig::testing(),
    )
    .await;

    let inbound = pipeline.inbound_sender();
    inbound.send(InboundMessage::background(promo("m-1"))).await.unwrap();
    inbound.send(InboundMessage::background(promo("m-2"))).await.unwrap();
    pipeline.shutdown().await.unwrap();

    assert_eq!(notifier.displayed().len(), 2);
    assert_eq!(pipeline.stats().handler.presented, 2);
}

#[tokio::test]
async fn notification_bearing_and_empty_messages_are_not_presented() {
    let notifier = Arc::new(RecordingNotifier::new());
    let mut pipeline = start(
        Arc::new(MockBackend::new()),
        notifier.clone(),
        PipelineConfig::testing(),
    )
    .await;

    let inbound = pipeline.inbound_sender();
    let bearing = RemoteMessage::with_notification("m-1", "Hi", "there")
        .with_data("title", "Hi")
        .with_data("body", "there");
    inbound.send(InboundMessage::killed(bearing)).await.unwrap();
    inbound
        .send(InboundMessage::killed(RemoteMessage::data_only("m-2", [("orderId", "9")])))
        .await
        .unwrap();
    pipeline.shutdown().await.unwrap();

    assert!(notifier.displayed().is_empty());
    assert_eq!(pipeline.stats().handler.not_presented, 2);
}

#[tokio::test]
async fn redelivered_message_id_is_presented_once() {
    let notifier = Arc::new(RecordingNotifier::new());
    let mut pipeline = start(
        Arc::new(MockBackend::new()),
        notifier.clone(),
        PipelineConfig::testing(),
    )
    .await;

    let inbound = pipeline.inbound_sender();
    for _ in 0..3 {
        inbound.send(InboundMessage::background(promo("same"))).await.unwrap();
    }
    pipeline.shutdown().await.unwrap();

    assert_eq!(notifier.displayed().len(), 1);
    assert_eq!(pipeline.stats().handler.duplicates, 2);
}

#[tokio::test]
async fn messages_sent_before_session_exists_are_not_lost() {
    let backend = Arc::new(MockBackend::new().with_init_delay(Duration::from_millis(50)));
    let notifier = Arc::new(RecordingNotifier::new());
    let mut pipeline = start(backend.clone(), notifier.clone(), PipelineConfig::testing()).await;

    pipeline
        .inbound_sender()
        .send(InboundMessage::killed(promo("early")))
        .await
        .unwrap();

    pipeline.acquire_session().await.unwrap();
    pipeline.shutdown().await.unwrap();

    assert_eq!(notifier.displayed().len(), 1);
}

#[tokio::test]
async fn concurrent_acquisition_initializes_once() {
    let backend = Arc::new(MockBackend::new().with_init_delay(Duration::from_millis(20)));
    let initializer = Arc::new(SessionInitializer::new(
        backend.clone(),
        PipelineConfig::testing().provider,
    ));

    let handles = join_all((0..16).map(|_| {
        let initializer = Arc::clone(&initializer);
        tokio::spawn(async move { initializer.acquire().await })
    }))
    .await;

    let handles: Vec<_> = handles
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();
    assert_eq!(backend.init_calls(), 1);
    assert!(handles.iter().all(|handle| handle.ptr_eq(&handles[0])));
}

#[tokio::test]
async fn misconfigured_session_degrades_to_no_op() {
    let notifier = Arc::new(RecordingNotifier::new());
    let backend = Arc::new(MockBackend::new());
    let mut config = PipelineConfig::testing();
    config.provider.api_key.clear();
    let mut pipeline = start(backend.clone(), notifier.clone(), config).await;

    assert!(!pipeline.permissions().request_permission().await);
    assert!(pipeline.tokens().fetch_token().await.is_none());
    assert!(pipeline.subscribe_foreground().await.is_none());
    assert!(pipeline.stats().messaging_disabled);
    assert_eq!(backend.init_calls(), 0);
    assert_eq!(backend.service().request_calls(), 0);

    // Background presentation still works without a session
    pipeline
        .inbound_sender()
        .send(InboundMessage::killed(promo("m-1")))
        .await
        .unwrap();
    pipeline.shutdown().await.unwrap();
    assert_eq!(notifier.displayed().len(), 1);
}

#[tokio::test]
async fn provider_failure_is_not_retried() {
    let backend = Arc::new(MockBackend::new().with_init(InitBehavior::Fail("no network".into())));
    let pipeline = start(
        backend.clone(),
        Arc::new(RecordingNotifier::new()),
        PipelineConfig::testing(),
    )
    .await;

    assert!(pipeline.acquire_session().await.is_err());
    assert!(!pipeline.permissions().request_permission().await);
    assert!(pipeline.acquire_session().await.is_err());
    assert_eq!(backend.init_calls(), 1);
}

#[tokio::test]
async fn permission_codes_through_the_pipeline() {
    for (code, expected) in [(1, true), (2, true), (0, false), (-1, false)] {
        let service = Arc::new(MockMessagingService::new().with_request_code(code));
        let backend = Arc::new(MockBackend::new().with_service(service));
        let pipeline = start(
            backend,
            Arc::new(RecordingNotifier::new()),
            PipelineConfig::testing(),
        )
        .await;

        assert_eq!(
            pipeline.permissions().request_permission().await,
            expected,
            "status code {}",
            code
        );
    }
}

#[tokio::test]
async fn press_on_presented_notification_routes_intent() {
    let notifier = Arc::new(RecordingNotifier::new());
    let mut pipeline = start(
        Arc::new(MockBackend::new()),
        notifier.clone(),
        PipelineConfig::testing(),
    )
    .await;
    let mut intents = pipeline.take_intent_receiver().unwrap();

    let message = promo("m-1").with_data("route", "Promotions").with_data("promoId", "77");
    pipeline
        .inbound_sender()
        .send(InboundMessage::killed(message))
        .await
        .unwrap();

    let shown = loop {
        if let Some(shown) = notifier.displayed().pop() {
            break shown;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    };

    // The notification center hands back the data attached at display time
    pipeline
        .interaction_sender()
        .send(InteractionEvent::press(shown.notification_id.clone(), shown.data.clone()))
        .await
        .unwrap();
    pipeline
        .interaction_sender()
        .send(InteractionEvent::dismiss(NotificationId::new("other")))
        .await
        .unwrap();

    let intent = intents.recv().await.unwrap();
    assert_eq!(intent.route.as_deref(), Some("Promotions"));
    assert_eq!(intent.params.get("promoId").map(String::as_str), Some("77"));
    assert_eq!(intent.source, IntentSource::NotificationPress);

    pipeline.shutdown().await.unwrap();
    assert_eq!(pipeline.stats().router.ignored, 1);
}

#[tokio::test]
async fn foreground_mirror_and_background_share_dedup() {
    let notifier = Arc::new(RecordingNotifier::new());
    let mut config = PipelineConfig::testing();
    config.foreground = ForegroundPolicy::Mirror;
    let mut pipeline = start(Arc::new(MockBackend::new()), notifier.clone(), config).await;

    let subscription = pipeline.subscribe_foreground().await.unwrap();
    let foreground = subscription.sender();

    let message = RemoteMessage::with_notification("m-1", "Transfer received", "Rp 50.000");
    foreground
        .send(ForegroundEvent::Message(message.clone()))
        .await
        .unwrap();
    foreground
        .send(ForegroundEvent::Message(promo("m-2")))
        .await
        .unwrap();
    subscription.unsubscribe().await;

    // Same id arriving through the background handler is skipped
    pipeline
        .inbound_sender()
        .send(InboundMessage::background(promo("m-2")))
        .await
        .unwrap();
    pipeline.shutdown().await.unwrap();

    let titles: Vec<_> = notifier.displayed().into_iter().map(|d| d.title).collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"Transfer received".to_string()));
    assert!(titles.contains(&"Promo".to_string()));
}

#[tokio::test]
async fn identical_channel_is_created_once_across_messages() {
    let notifier = Arc::new(RecordingNotifier::new());
    let mut pipeline = start(
        Arc::new(MockBackend::new()),
        notifier.clone(),
        PipelineConfig::testing(),
    )
    .await;

    let inbound = pipeline.inbound_sender();
    inbound.send(InboundMessage::killed(promo("m-1"))).await.unwrap();
    while notifier.displayed().is_empty() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    inbound.send(InboundMessage::killed(promo("m-2"))).await.unwrap();
    pipeline.shutdown().await.unwrap();

    // Created on first use, then cached
    assert_eq!(notifier.displayed().len(), 2);
    assert_eq!(notifier.create_calls(), 1);
    assert_eq!(notifier.created_channels()[0].id, "default");
}

#[tokio::test]
async fn initial_notification_is_routed_on_subscribe() {
    let launch = RemoteMessage::with_notification("m-0", "Bill due", "Pay now")
        .with_data("screen", "Bills");
    let service = Arc::new(MockMessagingService::new().with_initial_notification(launch));
    let mut pipeline = start(
        Arc::new(MockBackend::new().with_service(service)),
        Arc::new(RecordingNotifier::new()),
        PipelineConfig::testing(),
    )
    .await;
    let mut intents = pipeline.take_intent_receiver().unwrap();

    let subscription = pipeline.subscribe_foreground().await.unwrap();
    let intent = intents.recv().await.unwrap();
    assert_eq!(intent.route.as_deref(), Some("Bills"));
    assert_eq!(intent.source, IntentSource::InitialNotification);

    subscription.unsubscribe().await;
    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn warm_up_reports_unavailable_bridge() {
    let backend = Arc::new(MockBackend::new().with_bridge_ready_after(u32::MAX));
    let mut config = PipelineConfig::testing();
    config.bridge.ready_timeout_ms = 10;

    let mut pipeline = PipelineBuilder::new()
        .with_config(config)
        .with_backend(backend)
        .with_notifier(Arc::new(RecordingNotifier::new()))
        .build_and_start()
        .await
        .unwrap();

    assert!(pipeline.messaging().ready().await.is_err());
    assert!(pipeline.stats().messaging_disabled);
    assert!(pipeline.tokens().fetch_token().await.is_none());

    let mut data = BTreeMap::new();
    data.insert("route".to_string(), "Home".to_string());
    pipeline
        .interaction_sender()
        .send(InteractionEvent::press(NotificationId::new("n"), data))
        .await
        .unwrap();
    pipeline.shutdown().await.unwrap();
    assert_eq!(pipeline.stats().router.dispatched, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cold_start_burst_and_warm_up_share_one_channel_creation() {
    let notifier = Arc::new(RecordingNotifier::new().with_create_delay(Duration::from_millis(20)));
    let mut pipeline = PipelineBuilder::new()
        .with_config(PipelineConfig::testing())
        .with_backend(Arc::new(MockBackend::new()))
        .with_notifier(notifier.clone())
        .build_and_start()
        .await
        .unwrap();

    let inbound = pipeline.inbound_sender();
    for i in 0..8 {
        inbound
            .send(InboundMessage::killed(promo(&format!("burst-{}", i))))
            .await
            .unwrap();
    }
    pipeline.shutdown().await.unwrap();

    assert_eq!(notifier.displayed().len(), 8);
    assert_eq!(notifier.create_calls(), 1);
}

#[tokio::test]
async fn missing_permission_fails_presentation_without_retry() {
    let notifier = Arc::new(RecordingNotifier::new().without_permission());
    let mut pipeline = start(
        Arc::new(MockBackend::new()),
        notifier.clone(),
        PipelineConfig::testing(),
    )
    .await;

    let inbound = pipeline.inbound_sender();
    inbound.send(InboundMessage::killed(promo("m-1"))).await.unwrap();
    inbound.send(InboundMessage::background(promo("m-1"))).await.unwrap();
    pipeline.shutdown().await.unwrap();

    let stats = pipeline.stats().handler;
    assert!(notifier.displayed().is_empty());
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.duplicates, 1);
}
