#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;

use tally_gateway::store::InMemoryCounterStore;

use common::{app, get, PendingStore};

#[tokio::test]
async fn healthz_and_readyz() {
    let (state, router) = app(Arc::new(InMemoryCounterStore::new()));

    let h = get(&router, "/healthz").await;
    assert_eq!((h.status, h.raw.as_str()), (StatusCode::OK, "ok"));

    let r = get(&router, "/readyz").await;
    assert_eq!((r.status, r.raw.as_str()), (StatusCode::OK, "ready"));

    state.set_draining();
    let r = get(&router, "/readyz").await;
    assert_eq!((r.status, r.raw.as_str()), (StatusCode::SERVICE_UNAVAILABLE, "draining"));

    // draining only affects readiness, counting keeps working for in-flight traffic
    assert_eq!(get(&router, "/counter").await.status, StatusCode::OK);
}

#[tokio::test]
async fn metrics_report_increments() {
    let (_, router) = app(Arc::new(InMemoryCounterStore::new()));

    get(&router, "/counter").await;
    get(&router, "/counter").await;
    get(&router, "/visitor").await;

    let m = get(&router, "/metrics").await;
    assert_eq!(m.status, StatusCode::OK);
    assert!(m.raw.contains("tally_increments_total{counter=\"/counter\",outcome=\"ok\"} 2"), "{}", m.raw);
    assert!(m.raw.contains("tally_increments_total{counter=\"/visitor\",outcome=\"ok\"} 1"), "{}", m.raw);
    assert!(m.raw.contains("tally_increments_in_flight{counter=\"/counter\"} 0"), "{}", m.raw);
    assert!(m.raw.contains("tally_increment_duration_micros_count{counter=\"/visitor\"} 1"), "{}", m.raw);
    assert!(m.raw.contains("tally_counters_configured 2"));
    assert!(m.raw.contains("tally_draining 0"));
}

#[tokio::test]
async fn abandoned_requests_release_in_flight_gauge() {
    let (state, router) = app(Arc::new(PendingStore));

    for _ in 0..3 {
        let res = tokio::time::timeout(Duration::from_millis(20), get(&router, "/counter")).await;
        assert!(res.is_err(), "store never completes, request must time out");
    }

    let m = state.metrics();
    let labels = [("counter", "/counter")];
    assert_eq!(m.increments_in_flight.get(&labels), 0);
    assert_eq!(m.increment_duration.count(&labels), 3);
    assert_eq!(m.increments.get(&[("counter", "/counter"), ("outcome", "ok")]), 0);

    let out = get(&router, "/metrics").await;
    assert!(out.raw.contains("tally_increments_in_flight{counter=\"/counter\"} 0"), "{}", out.raw);
}
