//! Unit tests for index-result fan-in routing

use omr_application::index_router::IndexResultRouter;
use omr_domain::ports::MessageHandler;
use omr_domain::registry::{IndexFlag, IndexTaskResult, ResultEnvelope};

fn result(task_id: i64, sheet_id: u32) -> IndexTaskResult {
    IndexTaskResult {
        task_id,
        sheet_id,
        index_number: Some("190001".to_owned()),
        confidence: 0.9,
        flag: IndexFlag::Ok,
    }
}

#[tokio::test]
async fn routes_to_the_registered_task() {
    let router = IndexResultRouter::new();
    let mut rx = router.register(7);

    let envelope = ResultEnvelope::completed(7, result(7, 2));
    router
        .handle(&serde_json::to_vec(&envelope).unwrap())
        .await
        .unwrap();

    let delivered = rx.recv().await.unwrap();
    assert_eq!(delivered.sheet_id, 2);
}

#[tokio::test]
async fn unknown_task_is_dropped_without_error() {
    let router = IndexResultRouter::new();
    let envelope = ResultEnvelope::completed(99, result(99, 0));
    router
        .handle(&serde_json::to_vec(&envelope).unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn deregistered_task_stops_receiving() {
    let router = IndexResultRouter::new();
    let mut rx = router.register(7);
    router.deregister(7);

    assert!(!router.route(result(7, 0)));
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn failed_envelopes_are_not_routed() {
    let router = IndexResultRouter::new();
    let mut rx = router.register(7);

    let envelope: ResultEnvelope<IndexTaskResult> = ResultEnvelope::failed(7, "no index box");
    router
        .handle(&serde_json::to_vec(&envelope).unwrap())
        .await
        .unwrap();

    // Channel stays open; nothing was delivered.
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn concurrent_tasks_do_not_cross() {
    let router = IndexResultRouter::new();
    let mut rx_a = router.register(1);
    let mut rx_b = router.register(2);

    assert!(router.route(result(2, 5)));
    assert!(router.route(result(1, 3)));

    assert_eq!(rx_a.recv().await.unwrap().sheet_id, 3);
    assert_eq!(rx_b.recv().await.unwrap().sheet_id, 5);
}
