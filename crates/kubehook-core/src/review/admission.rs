//! `admission.k8s.io` review documents.
//!
//! The wire types are `kube-core`'s. Embedded objects decode as
//! `DynamicObject`; the admission processor decides which concrete resource
//! type they must also satisfy. A malformed object must not fail decoding of
//! the surrounding review, so the review is kept without it and the decode
//! failure travels alongside.

use kube_core::DynamicObject;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{KubehookError, Result};

use super::kind::TypeMeta;

pub use kube_core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};

/// An admission review as received.
#[derive(Debug, Clone)]
pub struct AdmissionInput {
    pub review: AdmissionReview<DynamicObject>,
    /// Set when `request.object` / `request.oldObject` could not be decoded.
    /// Both are then absent from `review`.
    pub object_error: Option<String>,
}

impl AdmissionInput {
    /// Decode a review body that is already known to be a JSON object.
    pub fn from_value(mut body: Value) -> Result<Self> {
        let err = match AdmissionReview::<DynamicObject>::deserialize(&body) {
            Ok(review) => {
                return Ok(Self {
                    review,
                    object_error: None,
                })
            }
            Err(e) => e,
        };

        let stripped = body
            .get_mut("request")
            .and_then(Value::as_object_mut)
            .map(|req| {
                [req.remove("object"), req.remove("oldObject")]
                    .iter()
                    .any(Option::is_some)
            })
            .unwrap_or(false);

        // Retry without the objects; if the review still fails, the objects
        // were not the problem.
        match AdmissionReview::<DynamicObject>::deserialize(&body) {
            Ok(review) if stripped => Ok(Self {
                review,
                object_error: Some(err.to_string()),
            }),
            _ => Err(KubehookError::Decode(format!(
                "invalid AdmissionReview body: {err}"
            ))),
        }
    }

    pub fn types(&self) -> TypeMeta {
        TypeMeta::new(
            self.review.types.api_version.clone(),
            self.review.types.kind.clone(),
        )
    }

    pub fn request(&self) -> Option<&AdmissionRequest<DynamicObject>> {
        self.review.request.as_ref()
    }
}
