//! Per-route latency middleware.
//!
//! Installed with `route_layer` so the matched route template is known; the
//! histogram is keyed by that template rather than the raw URI.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::app_state::AppState;

pub async fn track_latency(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    let started = Instant::now();
    let res = next.run(req).await;
    app.metrics()
        .http_duration
        .observe(&[("path", path.as_str())], started.elapsed());
    res
}
