use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;
use tracing::Instrument;

use kubehook_core::error::KubehookError;
use kubehook_core::review::{peek_types, IncomingEnvelope, OutgoingEnvelope, ReviewKind};

use super::registry::Registry;
use crate::obs::{GatewayMetrics, TraceContext};

/// One review kind's processing logic.
#[async_trait]
pub trait ReviewProcessor: Send + Sync {
    fn kind(&self) -> ReviewKind;
    async fn process(&self, trace: &TraceContext, review: IncomingEnvelope) -> ProcessingOutcome;
}

/// Result of one processor run.
#[derive(Debug)]
pub enum ProcessingOutcome {
    Completed(OutgoingEnvelope),
    /// `envelope` is set when the processor still produced a full response
    /// (admission denial on an undecodable object).
    Failed {
        cause: KubehookError,
        envelope: Option<OutgoingEnvelope>,
    },
}

impl ProcessingOutcome {
    /// Outcome for a processor handed a review of another kind.
    pub(crate) fn mismatched(expected: ReviewKind, got: &IncomingEnvelope) -> Self {
        ProcessingOutcome::Failed {
            cause: KubehookError::Internal(format!(
                "{expected} processor received {}",
                got.kind()
            )),
            envelope: None,
        }
    }
}

/// Dispatch failure. An `envelope` may accompany the error; the error still
/// decides the HTTP status.
#[derive(Debug, Error)]
#[error("{cause}")]
pub struct DispatchError {
    pub cause: KubehookError,
    pub envelope: Option<OutgoingEnvelope>,
}

impl From<KubehookError> for DispatchError {
    fn from(cause: KubehookError) -> Self {
        Self { cause, envelope: None }
    }
}

/// Decodes raw review bodies, classifies them, and runs the matching processor.
pub struct Dispatcher {
    registry: Arc<Registry>,
    metrics: Arc<GatewayMetrics>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, metrics: Arc<GatewayMetrics>) -> Self {
        Self { registry, metrics }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub async fn dispatch(
        &self,
        trace: &TraceContext,
        body: &[u8],
    ) -> Result<OutgoingEnvelope, DispatchError> {
        let span = tracing::info_span!(
            parent: trace.span(),
            "handleIncomingRequest",
            kind = tracing::field::Empty,
        );
        let trace = trace.child(span.clone());

        let res = self.dispatch_inner(&trace, body).instrument(span).await;
        if let Err(e) = &res {
            self.metrics
                .dispatch_errors
                .inc(&[("code", e.cause.client_code().as_str())]);
        }
        res
    }

    async fn dispatch_inner(
        &self,
        trace: &TraceContext,
        body: &[u8],
    ) -> Result<OutgoingEnvelope, DispatchError> {
        self.metrics.incoming_requests.inc(&[]);

        let types = peek_types(body).map_err(|e| {
            tracing::warn!(error = %e, body_len = body.len(), "unable to parse review body");
            e
        })?;
        trace.span().record("kind", types.kind.as_str());

        let processor = self.registry.resolve(&types.kind).map_err(|e| {
            tracing::warn!(kind = %types.kind, "unhandled review kind");
            e
        })?;
        let kind = processor.kind();

        let review = IncomingEnvelope::project(kind, body).map_err(|e| {
            tracing::warn!(%kind, error = %e, "unable to decode review");
            e
        })?;
        tracing::debug!(%kind, trace_id = %trace.trace_id(), "processing incoming request");

        self.metrics.review_requests.inc(&[("kind", kind.as_str())]);
        let started = Instant::now();
        let outcome = processor.process(trace, review).await;
        self.metrics
            .dispatch_duration
            .observe(&[("kind", kind.as_str())], started.elapsed());

        match outcome {
            ProcessingOutcome::Completed(envelope) => Ok(envelope),
            ProcessingOutcome::Failed { cause, envelope } => {
                tracing::warn!(%kind, error = %cause, has_envelope = envelope.is_some(), "review processing failed");
                Err(DispatchError { cause, envelope })
            }
        }
    }
}
