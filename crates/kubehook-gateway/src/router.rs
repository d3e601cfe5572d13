//! Axum router wiring.
//!
//! Exposes the review route (configurable, `/audit` by default) plus the ops
//! routes, all timed by the latency middleware.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    let review_path = state.cfg().gateway.review_path.clone();

    Router::new()
        .route(&review_path, post(transport::http::handle_review))
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            transport::latency::track_latency,
        ))
        .with_state(state)
}
