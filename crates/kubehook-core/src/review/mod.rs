//! Review wire formats.
//!
//! The API server posts one of three review documents to the same endpoint:
//! - `AdmissionReview` (admission.k8s.io): admission control decisions.
//! - `SubjectAccessReview` (authorization.k8s.io): webhook authorization.
//! - `EventList` (audit.k8s.io): audit backend batches.
//!
//! The `kind` field selects which of them a body holds. `envelope` turns the
//! raw body into a typed [`IncomingEnvelope`] once the kind is known, and
//! defines the single [`OutgoingEnvelope`] shape written back.

pub mod admission;
pub mod audit;
pub mod authorization;
pub mod envelope;
pub mod kind;

use serde::{Deserialize, Deserializer};

pub use admission::{AdmissionInput, AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
pub use audit::{Event, EventList, EventListAck, EventSummary};
pub use authorization::SubjectAccessReview;
pub use envelope::{peek_types, IncomingEnvelope, OutgoingEnvelope, ReviewOutcome};
pub use kind::{ReviewKind, TypeMeta};

/// Missing and explicit `null` both decode to the default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
