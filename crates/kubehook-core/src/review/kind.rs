use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KubehookError;

/// `apiVersion` + `kind` header carried by every review document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

impl TypeMeta {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }
}

/// Closed set of review kinds the receiver understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewKind {
    AdmissionReview,
    SubjectAccessReview,
    EventList,
}

impl ReviewKind {
    /// All kinds, in registration order.
    pub const ALL: [ReviewKind; 3] = [
        ReviewKind::AdmissionReview,
        ReviewKind::SubjectAccessReview,
        ReviewKind::EventList,
    ];

    /// Wire value of the `kind` field.
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewKind::AdmissionReview => "AdmissionReview",
            ReviewKind::SubjectAccessReview => "SubjectAccessReview",
            ReviewKind::EventList => "EventList",
        }
    }
}

impl fmt::Display for ReviewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewKind {
    type Err = KubehookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AdmissionReview" => Ok(ReviewKind::AdmissionReview),
            "SubjectAccessReview" => Ok(ReviewKind::SubjectAccessReview),
            "EventList" => Ok(ReviewKind::EventList),
            other => Err(KubehookError::UnknownKind(other.to_string())),
        }
    }
}
