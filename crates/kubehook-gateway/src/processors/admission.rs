use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube_core::DynamicObject;

use kubehook_core::error::{KubehookError, Result};
use kubehook_core::review::{
    AdmissionInput, AdmissionRequest, AdmissionResponse, IncomingEnvelope, OutgoingEnvelope,
    ReviewKind,
};

use crate::dispatch::{ProcessingOutcome, ReviewProcessor};
use crate::obs::{GatewayMetrics, TraceContext};

/// Admission object decoded just enough to identify it.
#[derive(Debug)]
enum AdmittedObject {
    Pod(Box<Pod>),
    Other(ObjectMeta),
}

impl AdmittedObject {
    fn name(&self) -> Option<&str> {
        match self {
            AdmittedObject::Pod(pod) => pod.metadata.name.as_deref(),
            AdmittedObject::Other(meta) => meta.name.as_deref(),
        }
    }
}

fn unmarshal_error(e: impl std::fmt::Display) -> KubehookError {
    KubehookError::Decode(format!("could not unmarshal raw object: {e}"))
}

/// Decode the object under review. Pods must decode as `core/v1` Pods;
/// anything else only needs the well-formed `metadata` the review already
/// carries. DELETE carries only `oldObject`.
fn decode_object(
    input: &AdmissionInput,
    req: &AdmissionRequest<DynamicObject>,
) -> Result<AdmittedObject> {
    if let Some(e) = &input.object_error {
        return Err(unmarshal_error(e));
    }
    let obj = req
        .object
        .as_ref()
        .or(req.old_object.as_ref())
        .ok_or_else(|| KubehookError::Decode("admission request carries no object".into()))?;

    if req.kind.kind == "Pod" {
        serde_json::to_value(obj)
            .and_then(serde_json::from_value::<Pod>)
            .map(|pod| AdmittedObject::Pod(Box::new(pod)))
            .map_err(unmarshal_error)
    } else {
        Ok(AdmittedObject::Other(obj.metadata.clone()))
    }
}

pub struct AdmissionProcessor {
    metrics: Arc<GatewayMetrics>,
}

impl AdmissionProcessor {
    pub fn new(metrics: Arc<GatewayMetrics>) -> Self {
        Self { metrics }
    }

    /// Reply under the review's own type header.
    fn reply(input: &AdmissionInput, mut response: AdmissionResponse) -> OutgoingEnvelope {
        response.types = input.review.types.clone();
        OutgoingEnvelope::from(response.into_review())
    }

    fn review(&self, trace: &TraceContext, input: AdmissionInput) -> ProcessingOutcome {
        let Some(req) = input.request() else {
            let cause = KubehookError::Decode("admission review carries no request".into());
            tracing::error!(error = %cause, "admission review denied");
            self.metrics.admission_denied.inc(&[]);
            let response = input
                .review
                .response
                .clone()
                .unwrap_or_else(|| AdmissionResponse::invalid(cause.to_string()))
                .deny(cause.to_string());
            return ProcessingOutcome::Failed {
                envelope: Some(Self::reply(&input, response)),
                cause,
            };
        };
        trace.span().record("uid", req.uid.as_str());

        // The review's own response is echoed back; synthesize one when absent.
        let response = input
            .review
            .response
            .clone()
            .unwrap_or_else(|| AdmissionResponse::from(req));

        match decode_object(&input, req) {
            Err(cause) => {
                tracing::error!(
                    uid = %req.uid,
                    namespace = ?req.namespace,
                    operation = ?req.operation,
                    error = %cause,
                    "admission review denied"
                );
                self.metrics.admission_denied.inc(&[]);
                let response = response.deny(cause.to_string());
                ProcessingOutcome::Failed {
                    envelope: Some(Self::reply(&input, response)),
                    cause,
                }
            }
            Ok(object) => {
                tracing::info!(
                    kind = %req.kind.kind,
                    namespace = ?req.namespace,
                    name = ?object.name(),
                    request_name = ?req.name,
                    uid = %req.uid,
                    user = ?req.user_info.username,
                    operation = ?req.operation,
                    allowed = response.allowed,
                    trace_id = %trace.trace_id(),
                    "admission review complete"
                );
                self.metrics.admission_allowed.inc(&[]);
                ProcessingOutcome::Completed(Self::reply(&input, response))
            }
        }
    }
}

#[async_trait]
impl ReviewProcessor for AdmissionProcessor {
    fn kind(&self) -> ReviewKind {
        ReviewKind::AdmissionReview
    }

    async fn process(&self, trace: &TraceContext, review: IncomingEnvelope) -> ProcessingOutcome {
        self.metrics.admission_processed.inc(&[]);
        let input = match review {
            IncomingEnvelope::Admission(input) => input,
            other => return ProcessingOutcome::mismatched(self.kind(), &other),
        };
        let span = tracing::info_span!(
            parent: trace.span(),
            "handleAdmissionReview",
            uid = tracing::field::Empty,
        );
        let trace = trace.child(span.clone());
        span.in_scope(|| self.review(&trace, input))
    }
}
