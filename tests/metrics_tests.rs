// Metric store tests

use redfish_gateway::metrics::{DerivedMetric, MetricStore, Metrics, RawMetric};

#[test]
fn test_counters_start_at_zero() {
    let store = MetricStore::new();
    assert_eq!(store.get("sat1", DerivedMetric::ResponsesTotal), 0);
    assert_eq!(store.get("sat1", DerivedMetric::AverageLatencyMs), 0);
    assert_eq!(store.get("sat1", DerivedMetric::RequestsSucceeded), 0);
}

#[test]
fn test_response_codes_bucketed() {
    let mut metrics = Metrics::default();
    metrics.record_response_code(100);
    metrics.record_response_code(200);
    metrics.record_response_code(204);
    metrics.record_response_code(301);
    metrics.record_response_code(404);
    metrics.record_response_code(500);
    assert_eq!(metrics.get(DerivedMetric::Responses1xx), 1);
    assert_eq!(metrics.get(DerivedMetric::Responses2xx), 2);
    assert_eq!(metrics.get(DerivedMetric::Responses3xx), 1);
    assert_eq!(metrics.get(DerivedMetric::Responses4xx), 1);
    assert_eq!(metrics.get(DerivedMetric::Responses5xx), 1);
    assert_eq!(metrics.get(DerivedMetric::ResponsesTotal), 6);
}

#[test]
fn test_synthetic_codes_classified() {
    let mut metrics = Metrics::default();
    metrics.record_response_code(200);
    metrics.record_response_code(429);
    metrics.record_response_code(429);
    metrics.record_response_code(502);
    assert_eq!(metrics.get(DerivedMetric::RequestsSucceeded), 1);
    assert_eq!(metrics.get(DerivedMetric::RequestsDropped), 2);
    assert_eq!(metrics.get(DerivedMetric::RequestsFailed), 1);
    // Dropped and failed dispatches still land in their code buckets.
    assert_eq!(metrics.get(DerivedMetric::Responses4xx), 2);
    assert_eq!(metrics.get(DerivedMetric::Responses5xx), 1);
    assert_eq!(metrics.get(DerivedMetric::ResponsesTotal), 4);
}

#[test]
fn test_error_statuses_count_as_succeeded_dispatches() {
    // A real 404 or 500 from the satellite is a completed round trip.
    let mut metrics = Metrics::default();
    metrics.record_response_code(404);
    metrics.record_response_code(500);
    assert_eq!(metrics.get(DerivedMetric::RequestsSucceeded), 2);
}

#[test]
fn test_average_latency() {
    let mut metrics = Metrics::default();
    metrics.increment(RawMetric::LatencyMs, 30);
    metrics.record_response_code(200);
    metrics.increment(RawMetric::LatencyMs, 10);
    metrics.record_response_code(200);
    metrics.increment(RawMetric::LatencyMs, 20);
    metrics.record_response_code(502);
    assert_eq!(metrics.get(DerivedMetric::AverageLatencyMs), 20);
}

#[test]
fn test_entities_tracked_independently() {
    let store = MetricStore::new();
    store.update("sat1", |m| m.record_response_code(200));
    store.update("sat1", |m| m.record_response_code(200));
    store.update("sat2", |m| m.record_response_code(502));
    assert_eq!(store.get("sat1", DerivedMetric::RequestsSucceeded), 2);
    assert_eq!(store.get("sat1", DerivedMetric::RequestsFailed), 0);
    assert_eq!(store.get("sat2", DerivedMetric::RequestsFailed), 1);
}
