//! `authorization.k8s.io/v1` SubjectAccessReview.

use k8s_openapi::api::authorization::v1::{SubjectAccessReviewSpec, SubjectAccessReviewStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

use super::kind::TypeMeta;
use super::null_as_default;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAccessReview {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMeta>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spec: SubjectAccessReviewSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SubjectAccessReviewStatus>,
}

impl SubjectAccessReview {
    pub fn types(&self) -> TypeMeta {
        TypeMeta::new(self.api_version.clone(), self.kind.clone())
    }

    /// Subject the review is about: the user, or the first group when the
    /// API server only sent groups.
    pub fn subject(&self) -> Option<&str> {
        self.spec
            .user
            .as_deref()
            .or_else(|| self.spec.groups.as_ref().and_then(|g| g.first()).map(String::as_str))
    }

    /// Namespace of the resource being accessed, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.spec
            .resource_attributes
            .as_ref()
            .and_then(|r| r.namespace.as_deref())
    }

    /// Name of the resource being accessed, or the non-resource path.
    pub fn target_name(&self) -> Option<&str> {
        if let Some(r) = &self.spec.resource_attributes {
            return r.name.as_deref().or(r.resource.as_deref());
        }
        self.spec
            .non_resource_attributes
            .as_ref()
            .and_then(|n| n.path.as_deref())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_spec_is_empty() {
        let sar: SubjectAccessReview = serde_json::from_value(json!({
            "apiVersion": "authorization.k8s.io/v1",
            "kind": "SubjectAccessReview",
            "spec": null
        }))
        .unwrap();
        assert_eq!(sar.spec, SubjectAccessReviewSpec::default());
        assert_eq!(sar.subject(), None);
        assert_eq!(sar.target_name(), None);
    }

    #[test]
    fn subject_falls_back_to_first_group() {
        let sar: SubjectAccessReview = serde_json::from_value(json!({
            "kind": "SubjectAccessReview",
            "spec": { "groups": ["ops", "dev"], "nonResourceAttributes": { "path": "/healthz" } }
        }))
        .unwrap();
        assert_eq!(sar.subject(), Some("ops"));
        assert_eq!(sar.target_name(), Some("/healthz"));
    }
}
