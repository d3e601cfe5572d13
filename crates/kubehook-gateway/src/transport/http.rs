//! Review endpoint handler.
//!
//! Responsibilities:
//! - Extract the caller's trace context (`traceparent`), falling back to a new root
//! - Open the request root span `processIncomingRequest`
//! - Read the full body, then hand it to the dispatcher
//! - Map the dispatch result to HTTP: 200 + JSON envelope, or 500 + error text
//!
//! The root span closes when this handler's future completes, which is after
//! the response is built but before hyper writes it to the socket. Write time
//! is therefore not part of the span; it shows up in the latency histogram.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::Instrument;

use kubehook_core::error::KubehookError;
use kubehook_core::review::OutgoingEnvelope;

use crate::app_state::AppState;
use crate::dispatch::DispatchError;
use crate::obs::trace::{self, TraceContext};

const APPLICATION_JSON: &str = "application/json";

pub async fn handle_review(State(app): State<AppState>, headers: HeaderMap, body: Body) -> Response {
    let parent = match trace::extract(&headers) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "unable to extract trace headers from request; starting new trace");
            None
        }
    };

    let span = tracing::info_span!(
        "processIncomingRequest",
        trace_id = tracing::field::Empty,
        parent_span_id = tracing::field::Empty,
        status = tracing::field::Empty,
    );
    let ctx = TraceContext::root(parent, span.clone());
    span.record("trace_id", ctx.trace_id().as_str());
    if let Some(p) = ctx.parent_span_id() {
        span.record("parent_span_id", p.as_str());
    }

    let mut res = process(&app, &ctx, body).instrument(span.clone()).await;
    span.record("status", res.status().as_u16());

    if let Some(v) = ctx.traceparent_header() {
        res.headers_mut().insert(trace::TRACEPARENT, v);
    }
    res
}

async fn process(app: &AppState, ctx: &TraceContext, body: Body) -> Response {
    let limit = app.cfg().gateway.max_body_bytes;
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, limit, "unable to read request body");
            return DispatchError::from(KubehookError::Decode(format!("unable to read request body: {e}")))
                .into_response();
        }
    };

    match app.dispatcher().dispatch(ctx, &bytes).await {
        Ok(envelope) => write_envelope(&envelope),
        Err(DispatchError { cause, envelope }) => {
            if let Some(env) = envelope {
                tracing::warn!(
                    kind = %env.types.kind,
                    error = %cause,
                    "review produced a response but failed; replying with error"
                );
            }
            DispatchError::from(cause).into_response()
        }
    }
}

fn write_envelope(envelope: &OutgoingEnvelope) -> Response {
    match serde_json::to_vec(envelope) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))],
            body,
        )
            .into_response(),
        Err(e) => {
            let err = KubehookError::Write(format!("unable to encode response: {e}"));
            tracing::error!(error = %err, "unable to send response");
            DispatchError::from(err).into_response()
        }
    }
}

/// Every failure is a 500 with the error text as a plain-text body.
impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.cause.to_string()).into_response()
    }
}
