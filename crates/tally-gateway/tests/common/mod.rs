//! Shared fixtures for gateway integration tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use tally_core::counter::{Count, CounterKey};
use tally_core::error::{Result, TallyError};
use tally_gateway::app_state::AppState;
use tally_gateway::config::{self, TallyConfig};
use tally_gateway::router::build_router;
use tally_gateway::store::CounterStore;

/// Both endpoint flavours on one in-memory table.
pub const TWO_COUNTERS: &str = r#"
version: 1
counters:
  - path: "/counter"
    key_id: "counter"
    response_field_name: "visitor_count"
    on_store_error: respond
  - path: "/visitor"
    key_id: "visitors"
    response_field_name: "count"
    on_store_error: propagate
"#;

pub fn two_counters() -> TallyConfig {
    config::load_from_str(TWO_COUNTERS).expect("fixture config")
}

pub fn key_of(id: &str) -> CounterKey {
    CounterKey::new("visitor-count", id, "visitor_count")
}

pub fn app(store: Arc<dyn CounterStore>) -> (AppState, Router) {
    let state = AppState::new(two_counters(), store).expect("state");
    let router = build_router(state.clone());
    (state, router)
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
    pub raw: String,
}

pub async fn call(router: &Router, method: Method, uri: &str, body: &str) -> Reply {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let raw = String::from_utf8(bytes.to_vec()).unwrap();
    let body = serde_json::from_str(&raw).unwrap_or(serde_json::Value::Null);
    Reply { status, headers, body, raw }
}

pub async fn get(router: &Router, uri: &str) -> Reply {
    call(router, Method::GET, uri, "").await
}

/// Store whose every add is rejected the way a managed store rejects a call.
#[derive(Default)]
pub struct FailingStore {
    pub calls: AtomicU64,
}

#[async_trait]
impl CounterStore for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn add_and_get(&self, _key: &CounterKey, _delta: u64) -> Result<Count> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TallyError::Store(
            "AccessDeniedException: not authorized to perform UpdateItem".into(),
        ))
    }
}

/// Store that fails outside the store-failure category.
pub struct BrokenStore;

#[async_trait]
impl CounterStore for BrokenStore {
    fn backend(&self) -> &'static str {
        "broken"
    }

    async fn add_and_get(&self, _key: &CounterKey, _delta: u64) -> Result<Count> {
        Err(TallyError::Internal("worker pool gone".into()))
    }
}

/// Store whose add never completes, like a call stuck on the network.
pub struct PendingStore;

#[async_trait]
impl CounterStore for PendingStore {
    fn backend(&self) -> &'static str {
        "pending"
    }

    async fn add_and_get(&self, _key: &CounterKey, _delta: u64) -> Result<Count> {
        std::future::pending().await
    }
}
