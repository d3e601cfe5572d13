//! Incoming/outgoing envelopes.
//!
//! Decoding is two-phase: [`peek_types`] reads only the `apiVersion`/`kind`
//! header, the caller resolves the kind, then [`IncomingEnvelope::project`]
//! decodes the body into the matching review type.

use k8s_openapi::api::authorization::v1::SubjectAccessReviewStatus;
use kube_core::DynamicObject;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{KubehookError, Result};

use super::admission::{AdmissionInput, AdmissionResponse, AdmissionReview};
use super::audit::{EventList, EventListAck};
use super::authorization::SubjectAccessReview;
use super::kind::{ReviewKind, TypeMeta};

/// Parse a body that must be a single JSON object. Arrays and scalars are
/// rejected here, before any struct decoding sees them.
fn object_body(body: &[u8]) -> Result<Value> {
    serde_json::from_slice::<Map<String, Value>>(body)
        .map(Value::Object)
        .map_err(|e| KubehookError::Decode(format!("invalid envelope json: {e}")))
}

/// Decode only the type header of a review body.
pub fn peek_types(body: &[u8]) -> Result<TypeMeta> {
    TypeMeta::deserialize(&object_body(body)?)
        .map_err(|e| KubehookError::Decode(format!("invalid envelope json: {e}")))
}

/// A decoded review, one variant per [`ReviewKind`].
#[derive(Debug, Clone)]
pub enum IncomingEnvelope {
    Admission(AdmissionInput),
    Authorization(SubjectAccessReview),
    Audit(EventList),
}

impl IncomingEnvelope {
    /// Decode `body` as the review type selected by `kind`.
    pub fn project(kind: ReviewKind, body: &[u8]) -> Result<Self> {
        let value = object_body(body)?;
        let decoded = match kind {
            ReviewKind::AdmissionReview => {
                return AdmissionInput::from_value(value).map(Self::Admission);
            }
            ReviewKind::SubjectAccessReview => {
                SubjectAccessReview::deserialize(&value).map(Self::Authorization)
            }
            ReviewKind::EventList => EventList::deserialize(&value).map(Self::Audit),
        };
        decoded.map_err(|e| KubehookError::Decode(format!("invalid {kind} body: {e}")))
    }

    pub fn kind(&self) -> ReviewKind {
        match self {
            Self::Admission(_) => ReviewKind::AdmissionReview,
            Self::Authorization(_) => ReviewKind::SubjectAccessReview,
            Self::Audit(_) => ReviewKind::EventList,
        }
    }

    pub fn types(&self) -> TypeMeta {
        match self {
            Self::Admission(r) => r.types(),
            Self::Authorization(r) => r.types(),
            Self::Audit(r) => r.types(),
        }
    }
}

/// The single populated outcome of a review.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReviewOutcome {
    Admission { response: AdmissionResponse },
    Authorization { status: SubjectAccessReviewStatus },
    Audit { response: EventListAck },
}

impl ReviewOutcome {
    pub fn kind(&self) -> ReviewKind {
        match self {
            Self::Admission { .. } => ReviewKind::AdmissionReview,
            Self::Authorization { .. } => ReviewKind::SubjectAccessReview,
            Self::Audit { .. } => ReviewKind::EventList,
        }
    }
}

/// Normalized response body: the request's type header plus one outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEnvelope {
    #[serde(flatten)]
    pub types: TypeMeta,
    #[serde(flatten)]
    pub outcome: ReviewOutcome,
}

impl OutgoingEnvelope {
    /// The envelope carries the type header, so `response.types` is cleared.
    pub fn admission(types: TypeMeta, mut response: AdmissionResponse) -> Self {
        response.types = Default::default();
        Self {
            types,
            outcome: ReviewOutcome::Admission { response },
        }
    }

    pub fn authorization(types: TypeMeta, status: SubjectAccessReviewStatus) -> Self {
        Self {
            types,
            outcome: ReviewOutcome::Authorization { status },
        }
    }

    pub fn audit(types: TypeMeta, response: EventListAck) -> Self {
        Self {
            types,
            outcome: ReviewOutcome::Audit { response },
        }
    }

    pub fn admission_response(&self) -> Option<&AdmissionResponse> {
        match &self.outcome {
            ReviewOutcome::Admission { response } => Some(response),
            _ => None,
        }
    }

    pub fn authorization_status(&self) -> Option<&SubjectAccessReviewStatus> {
        match &self.outcome {
            ReviewOutcome::Authorization { status } => Some(status),
            _ => None,
        }
    }

    pub fn audit_ack(&self) -> Option<&EventListAck> {
        match &self.outcome {
            ReviewOutcome::Audit { response } => Some(response),
            _ => None,
        }
    }
}

impl From<AdmissionReview<DynamicObject>> for OutgoingEnvelope {
    fn from(review: AdmissionReview<DynamicObject>) -> Self {
        let types = TypeMeta::new(review.types.api_version, review.types.kind);
        let response = review
            .response
            .unwrap_or_else(|| AdmissionResponse::invalid("admission review carries no response"));
        Self::admission(types, response)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutgoingWire {
    #[serde(default)]
    api_version: String,
    #[serde(default)]
    kind: String,
    #[serde(default)]
    response: Option<Value>,
    #[serde(default)]
    status: Option<Value>,
}

// `response` means different things per kind, so the outcome is selected by
// `kind` rather than by shape.
impl<'de> Deserialize<'de> for OutgoingEnvelope {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = OutgoingWire::deserialize(deserializer)?;
        let kind: ReviewKind = wire.kind.parse().map_err(D::Error::custom)?;

        let outcome = match kind {
            ReviewKind::AdmissionReview => {
                let v = wire.response.ok_or_else(|| D::Error::missing_field("response"))?;
                ReviewOutcome::Admission {
                    response: serde_json::from_value(v).map_err(D::Error::custom)?,
                }
            }
            ReviewKind::SubjectAccessReview => {
                let v = wire.status.ok_or_else(|| D::Error::missing_field("status"))?;
                ReviewOutcome::Authorization {
                    status: serde_json::from_value(v).map_err(D::Error::custom)?,
                }
            }
            ReviewKind::EventList => {
                let v = wire.response.ok_or_else(|| D::Error::missing_field("response"))?;
                ReviewOutcome::Audit {
                    response: serde_json::from_value(v).map_err(D::Error::custom)?,
                }
            }
        };

        Ok(Self {
            types: TypeMeta::new(wire.api_version, wire.kind),
            outcome,
        })
    }
}
