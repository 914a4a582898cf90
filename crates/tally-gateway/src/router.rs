//! Axum router wiring.
//!
//! Every configured counter path accepts any method and goes to the one
//! counter handler; the ops endpoints sit alongside.

use axum::{
    routing::{any, get},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics));

    for c in &state.cfg().counters {
        router = router.route(&c.path, any(transport::http::counter_endpoint));
    }

    router.with_state(state)
}
