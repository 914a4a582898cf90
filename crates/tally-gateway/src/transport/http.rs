//! Counter endpoint handler.
//!
//! Method, query and body of the request are ignored; the matched route picks
//! the counter. On success the response carries the new count and
//! `Access-Control-Allow-Origin: *`. On a store failure the endpoint's error
//! policy decides: `respond` answers 500 with a JSON string, `propagate`
//! returns the error to the host surface (`HostError`). Neither error path
//! sets the CORS header.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use tally_core::counter::{count_body, store_error_body, Count};
use tally_core::error::TallyError;

use crate::app_state::AppState;
use crate::config::ErrorPolicy;
use crate::obs::metrics::GatewayMetrics;

/// Host-level failure: whatever the endpoint did not handle itself.
#[derive(Debug)]
pub struct HostError(pub TallyError);

impl From<TallyError> for HostError {
    fn from(e: TallyError) -> Self {
        Self(e)
    }
}

impl IntoResponse for HostError {
    fn into_response(self) -> Response {
        // config errors stop startup, so only store and internal failures get
        // here; details stay in the logs
        let body = Json(json!({
            "error": self.0.client_code().as_str(),
            "message": "internal server error",
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub fn success_response(field: &str, count: Count) -> Response {
    (
        StatusCode::OK,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        Json(count_body(field, count)),
    )
        .into_response()
}

pub fn store_error_response(err: &TallyError) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(store_error_body(err))).into_response()
}

/// Tracks one increment in flight. Dropping it, whether the store call
/// finished or the request future was abandoned mid-await, records the
/// duration and releases the gauge.
struct InFlight<'a> {
    metrics: &'a GatewayMetrics,
    path: &'a str,
    started: Instant,
}

impl<'a> InFlight<'a> {
    fn enter(metrics: &'a GatewayMetrics, path: &'a str) -> Self {
        metrics.increments_in_flight.inc(&[("counter", path)]);
        Self {
            metrics,
            path,
            started: Instant::now(),
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let labels = [("counter", self.path)];
        self.metrics.increment_duration.observe(&labels, self.started.elapsed());
        self.metrics.increments_in_flight.dec(&labels);
    }
}

pub async fn counter_endpoint(
    State(app): State<AppState>,
    matched: MatchedPath,
) -> Result<Response, HostError> {
    let svc = app.counter(matched.as_str()).ok_or_else(|| {
        TallyError::Internal(format!("no counter registered for {}", matched.as_str()))
    })?;

    let metrics = app.metrics();
    let path = svc.path();

    let in_flight = InFlight::enter(&metrics, path);
    let res = svc.increment_and_get().await;
    drop(in_flight);

    match res {
        Ok(count) => {
            metrics.increments.inc(&[("counter", path), ("outcome", "ok")]);
            tracing::debug!(counter = %path, key = %svc.key(), %count, "counter incremented");
            Ok(success_response(svc.field(), count))
        }
        Err(e) => {
            metrics.increments.inc(&[("counter", path), ("outcome", "error")]);
            if e.is_store_failure() {
                metrics
                    .store_errors
                    .inc(&[("backend", svc.backend()), ("counter", path)]);
            }

            match svc.policy() {
                ErrorPolicy::Respond if e.is_store_failure() => {
                    tracing::warn!(counter = %path, key = %svc.key(), error = %e, "store update failed");
                    Ok(store_error_response(&e))
                }
                _ => {
                    tracing::error!(counter = %path, key = %svc.key(), error = %e, "increment failed, propagating");
                    Err(HostError(e))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_error_hides_store_detail() {
        let resp = HostError(TallyError::Store("secret-arn".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[test]
    fn in_flight_guard_releases_on_drop() {
        let metrics = GatewayMetrics::default();
        let labels = [("counter", "/counter")];
        {
            let _g = InFlight::enter(&metrics, "/counter");
            assert_eq!(metrics.increments_in_flight.get(&labels), 1);
        }
        assert_eq!(metrics.increments_in_flight.get(&labels), 0);
        assert_eq!(metrics.increment_duration.count(&labels), 1);
    }

    #[test]
    fn success_response_sets_cors() {
        let resp = success_response("count", Count::new(6));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
