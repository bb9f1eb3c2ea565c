use super::*;

fn empty_snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        uptime_secs: 0,
        enqueued: 0,
        rejected: 0,
        processed: 0,
        panicked: 0,
        drains: 0,
        succeeded: 0,
        failed: 0,
        undelivered: 0,
    }
}

#[test]
fn test_metrics_new() {
    let metrics = DispatchMetrics::new();
    assert_eq!(metrics.enqueued.load(Ordering::Relaxed), 0);
    assert_eq!(metrics.uptime_secs(), 0);
}

#[test]
fn test_record_drain() {
    let metrics = DispatchMetrics::new();
    metrics.record_drain(3);
    metrics.record_drain(1);
    assert_eq!(metrics.drains.load(Ordering::Relaxed), 2);
    assert_eq!(metrics.processed.load(Ordering::Relaxed), 4);
}

#[test]
fn test_snapshot() {
    let metrics = DispatchMetrics::new();
    metrics.record_enqueued();
    metrics.record_enqueued();
    metrics.record_rejected();
    metrics.record_drain(1);
    metrics.record_succeeded();

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.enqueued, 2);
    assert_eq!(snapshot.rejected, 1);
    assert_eq!(snapshot.backlog(), 1);
    assert_eq!(snapshot.succeeded, 1);
}

#[test]
fn test_derived_rates() {
    let snapshot = MetricsSnapshot {
        processed: 30,
        drains: 10,
        succeeded: 27,
        failed: 3,
        ..empty_snapshot()
    };
    assert_eq!(snapshot.avg_batch_size(), 3.0);
    assert_eq!(snapshot.success_rate(), 0.9);
}

#[test]
fn test_zero_division() {
    let snapshot = empty_snapshot();
    assert_eq!(snapshot.avg_batch_size(), 0.0);
    assert_eq!(snapshot.success_rate(), 0.0);
    assert_eq!(snapshot.backlog(), 0);
}

#[test]
fn test_snapshot_serializes() {
    let json = serde_json::to_value(empty_snapshot()).unwrap();
    assert_eq!(json["drains"], 0);
    assert!(json.get("undelivered").is_some());
}
