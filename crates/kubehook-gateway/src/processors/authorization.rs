use std::sync::Arc;

use async_trait::async_trait;

use kubehook_core::review::{IncomingEnvelope, OutgoingEnvelope, ReviewKind, SubjectAccessReview};

use crate::dispatch::{ProcessingOutcome, ReviewProcessor};
use crate::obs::{GatewayMetrics, TraceContext};

pub const DEFAULT_ALLOW_REASON: &str = "defaultAllow";

/// Answers SubjectAccessReviews. Every request is allowed.
pub struct AuthorizationProcessor {
    metrics: Arc<GatewayMetrics>,
}

impl AuthorizationProcessor {
    pub fn new(metrics: Arc<GatewayMetrics>) -> Self {
        Self { metrics }
    }

    fn review(&self, trace: &TraceContext, sar: SubjectAccessReview) -> ProcessingOutcome {
        let mut status = sar.status.clone().unwrap_or_default();
        status.allowed = true;
        status.denied = None;
        status.reason = Some(DEFAULT_ALLOW_REASON.to_string());

        let verb = sar
            .spec
            .resource_attributes
            .as_ref()
            .and_then(|r| r.verb.as_deref());
        tracing::info!(
            kind = %ReviewKind::SubjectAccessReview,
            subject = ?sar.subject(),
            namespace = ?sar.namespace(),
            name = ?sar.target_name(),
            uid = ?sar.spec.uid,
            verb = ?verb,
            allowed = status.allowed,
            reason = DEFAULT_ALLOW_REASON,
            trace_id = %trace.trace_id(),
            "authorization request processed"
        );
        self.metrics.authorization_allowed.inc(&[]);

        ProcessingOutcome::Completed(OutgoingEnvelope::authorization(sar.types(), status))
    }
}

#[async_trait]
impl ReviewProcessor for AuthorizationProcessor {
    fn kind(&self) -> ReviewKind {
        ReviewKind::SubjectAccessReview
    }

    async fn process(&self, trace: &TraceContext, review: IncomingEnvelope) -> ProcessingOutcome {
        self.metrics.authorization_processed.inc(&[]);
        let sar = match review {
            IncomingEnvelope::Authorization(sar) => sar,
            other => return ProcessingOutcome::mismatched(self.kind(), &other),
        };
        let span = tracing::info_span!(parent: trace.span(), "handleSubjectAccessReview");
        let trace = trace.child(span.clone());
        span.in_scope(|| self.review(&trace, sar))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing::Span;

    #[tokio::test]
    async fn overrides_incoming_status() {
        let m = Arc::new(GatewayMetrics::new());
        let p = AuthorizationProcessor::new(Arc::clone(&m));
        let body = json!({
            "apiVersion": "authorization.k8s.io/v1",
            "kind": "SubjectAccessReview",
            "spec": { "user": "jane", "nonResourceAttributes": { "path": "/healthz", "verb": "get" } },
            "status": { "allowed": false, "denied": true, "reason": "upstream" }
        });
        let env = IncomingEnvelope::project(ReviewKind::SubjectAccessReview, &serde_json::to_vec(&body).unwrap())
            .unwrap();

        let trace = TraceContext::root(None, Span::none());
        let ProcessingOutcome::Completed(out) = p.process(&trace, env).await else {
            panic!("authorization never fails");
        };
        let status = out.authorization_status().unwrap();
        assert!(status.allowed);
        assert_eq!(status.denied, None);
        assert_eq!(status.reason.as_deref(), Some(DEFAULT_ALLOW_REASON));
        assert_eq!(out.types.kind, "SubjectAccessReview");
        assert_eq!(m.authorization_processed.get(&[]), 1);
        assert_eq!(m.authorization_allowed.get(&[]), 1);
        assert_eq!(m.authorization_denied.get(&[]), 0);
    }

    #[tokio::test]
    async fn rejects_foreign_review() {
        let m = Arc::new(GatewayMetrics::new());
        let p = AuthorizationProcessor::new(Arc::clone(&m));
        let env = IncomingEnvelope::project(ReviewKind::EventList, br#"{"kind":"EventList"}"#).unwrap();
        let trace = TraceContext::root(None, Span::none());
        assert!(matches!(
            p.process(&trace, env).await,
            ProcessingOutcome::Failed { envelope: None, .. }
        ));
        assert_eq!(m.authorization_processed.get(&[]), 1);
        assert_eq!(m.authorization_allowed.get(&[]), 0);
    }
}
