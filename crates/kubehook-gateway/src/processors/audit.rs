use std::sync::Arc;

use async_trait::async_trait;

use kubehook_core::review::{
    EventList, EventListAck, IncomingEnvelope, OutgoingEnvelope, ReviewKind,
};

use crate::dispatch::{ProcessingOutcome, ReviewProcessor};
use crate::obs::{GatewayMetrics, TraceContext};

/// Ingests audit event batches. Always acknowledges; a bad event never stops
/// the batch.
pub struct AuditProcessor {
    metrics: Arc<GatewayMetrics>,
}

impl AuditProcessor {
    pub fn new(metrics: Arc<GatewayMetrics>) -> Self {
        Self { metrics }
    }

    fn ingest(&self, trace: &TraceContext, list: EventList) -> ProcessingOutcome {
        for (index, event) in list.items.iter().enumerate() {
            let span = tracing::debug_span!(parent: trace.span(), "handleEvent", index);
            span.in_scope(|| {
                self.metrics.events_processed.inc(&[]);
                let s = event.summary();
                tracing::debug!(
                    audit_id = ?s.audit_id,
                    level = ?s.level,
                    stage = ?s.stage,
                    verb = ?s.verb,
                    user = ?s.username,
                    request_uri = ?s.request_uri,
                    namespace = ?s.namespace,
                    resource = ?s.resource,
                    name = ?s.name,
                    code = ?s.response_code,
                    "event processed"
                );
            });
        }

        tracing::info!(
            kind = %ReviewKind::EventList,
            items = list.items.len(),
            trace_id = %trace.trace_id(),
            "event list processed"
        );

        ProcessingOutcome::Completed(OutgoingEnvelope::audit(list.types(), EventListAck::accepted()))
    }
}

#[async_trait]
impl ReviewProcessor for AuditProcessor {
    fn kind(&self) -> ReviewKind {
        ReviewKind::EventList
    }

    async fn process(&self, trace: &TraceContext, review: IncomingEnvelope) -> ProcessingOutcome {
        self.metrics.event_lists_processed.inc(&[]);
        let list = match review {
            IncomingEnvelope::Audit(list) => list,
            other => return ProcessingOutcome::mismatched(self.kind(), &other),
        };
        let span = tracing::info_span!(parent: trace.span(), "handleEventList", items = list.items.len());
        let trace = trace.child(span.clone());
        span.in_scope(|| self.ingest(&trace, list))
    }
}
