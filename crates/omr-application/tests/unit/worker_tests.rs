//! Unit tests for the worker's input-queue handlers

use std::sync::Arc;

use omr_application::worker::{MarkingConfigHandler, TemplateConfigHandler, WorkerDeps};
use omr_domain::entities::template::TemplateConfigType;
use omr_domain::ports::MessageHandler;
use omr_domain::registry::{
    JobKind, MarkingConfigRequest, MarkingConfigResult, ResultEnvelope, TemplateConfigRequest,
    TemplateConfigResult,
};
use omr_domain::value_objects::MarkingConfig;

use crate::utils::{
    FakeBroker, FakeControl, FakeEventBus, FakeMarkingVision, FakeStore, FakeTemplateVision,
    small_grid_config,
};

fn deps(store: Arc<FakeStore>, broker: Arc<FakeBroker>, control: Arc<FakeControl>) -> WorkerDeps {
    WorkerDeps {
        store,
        broker,
        control,
        events: Arc::new(FakeEventBus::new()),
    }
}

fn template_config_request() -> Vec<u8> {
    serde_json::to_vec(&TemplateConfigRequest {
        id: 1,
        name: "physics".to_owned(),
        config_type: TemplateConfigType::GridBased,
        template_path: "uploads/templates/1/blank.jpg".to_owned(),
        clustering: None,
        save_intermediate_results: false,
        owner: 1,
        template_id: 9,
    })
    .unwrap()
}

#[tokio::test]
async fn template_config_handler_persists_artifacts_and_publishes_completed() {
    let store = Arc::new(FakeStore::new());
    store.put("uploads/templates/1/blank.jpg", b"blank");
    let broker = Arc::new(FakeBroker::new());
    let control = Arc::new(FakeControl::new());
    let handler = TemplateConfigHandler::new(
        deps(store.clone(), broker.clone(), control.clone()),
        Arc::new(FakeTemplateVision),
    );

    handler.handle(&template_config_request()).await.unwrap();

    // The worker stamped QUEUED -> PROCESSING on first touch.
    assert_eq!(control.processing_marks(), vec![(JobKind::TemplateConfig, 1)]);

    let published = broker.published_to(JobKind::TemplateConfig.result_routing_key());
    assert_eq!(published.len(), 1);
    let envelope: ResultEnvelope<TemplateConfigResult> =
        serde_json::from_slice(&published[0].body).unwrap();
    assert!(envelope.is_completed());

    let result = envelope.result.unwrap();
    assert!(result.template_config_path.starts_with("templates/1/9_"));
    assert!(result.output_image_path.ends_with("_template.jpg"));
    assert_eq!(result.bubble_config, small_grid_config());

    // Both artifacts landed in the store.
    assert_eq!(store.read(&result.output_image_path).unwrap(), b"warped");
    let saved: omr_domain::value_objects::TemplateConfig =
        serde_json::from_slice(&store.read(&result.template_config_path).unwrap()).unwrap();
    assert_eq!(saved, small_grid_config());
}

#[tokio::test]
async fn failing_stage_publishes_failed_envelope_then_errors() {
    let store = Arc::new(FakeStore::new());
    store.put("uploads/templates/1/blank.jpg", b"bad");
    let broker = Arc::new(FakeBroker::new());
    let handler = TemplateConfigHandler::new(
        deps(store, broker.clone(), Arc::new(FakeControl::new())),
        Arc::new(FakeTemplateVision),
    );

    let outcome = handler.handle(&template_config_request()).await;
    assert!(outcome.is_err());

    let published = broker.published_to(JobKind::TemplateConfig.result_routing_key());
    assert_eq!(published.len(), 1);
    let envelope: ResultEnvelope<TemplateConfigResult> =
        serde_json::from_slice(&published[0].body).unwrap();
    assert!(!envelope.is_completed());
    assert!(
        envelope
            .error_message
            .unwrap()
            .contains("calibration rectangles")
    );
}

#[tokio::test]
async fn cancelled_job_publishes_cancelled_failure() {
    let store = Arc::new(FakeStore::new());
    store.put("uploads/templates/1/blank.jpg", b"blank");
    let broker = Arc::new(FakeBroker::new());
    let control = Arc::new(FakeControl::new());
    control.cancel(JobKind::TemplateConfig, 1);
    let handler = TemplateConfigHandler::new(
        deps(store, broker.clone(), control),
        Arc::new(FakeTemplateVision),
    );

    assert!(handler.handle(&template_config_request()).await.is_err());

    let published = broker.published_to(JobKind::TemplateConfig.result_routing_key());
    let envelope: ResultEnvelope<TemplateConfigResult> =
        serde_json::from_slice(&published[0].body).unwrap();
    assert_eq!(envelope.error_message.as_deref(), Some("cancelled"));
}

#[tokio::test]
async fn marking_config_handler_caches_the_scheme_readings() {
    let store = Arc::new(FakeStore::new());
    store.put("templates/1/9_ab_template.jpg", b"template");
    // Scheme readings for the 3x2 grid: A, B, A.
    store.put(
        "uploads/marking_schemes/1/key.jpg",
        &serde_json::to_vec(&[1, 0, 0, 1, 1, 0]).unwrap(),
    );
    store.put(
        "templates/1/9_ab_config.json",
        &serde_json::to_vec(&small_grid_config()).unwrap(),
    );
    let broker = Arc::new(FakeBroker::new());
    let handler = MarkingConfigHandler::new(
        deps(store.clone(), broker.clone(), Arc::new(FakeControl::new())),
        Arc::new(FakeMarkingVision::new()),
    );

    let body = serde_json::to_vec(&MarkingConfigRequest {
        id: 3,
        name: "physics-key".to_owned(),
        template_path: "templates/1/9_ab_template.jpg".to_owned(),
        marking_scheme_path: "uploads/marking_schemes/1/key.jpg".to_owned(),
        template_config_path: "templates/1/9_ab_config.json".to_owned(),
        owner: 1,
        template_id: 9,
    })
    .unwrap();
    handler.handle(&body).await.unwrap();

    let published = broker.published_to(JobKind::MarkingConfig.result_routing_key());
    let envelope: ResultEnvelope<MarkingConfigResult> =
        serde_json::from_slice(&published[0].body).unwrap();
    assert!(envelope.is_completed());

    let result = envelope.result.unwrap();
    let cached: MarkingConfig =
        serde_json::from_slice(&store.read(&result.marking_config_path).unwrap()).unwrap();
    assert_eq!(
        cached.marked_flags(),
        vec![true, false, false, true, true, false]
    );
}
