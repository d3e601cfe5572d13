//! `audit.k8s.io` event lists (audit webhook backend batches).
//!
//! Events are kept as loose JSON. Ingestion always acknowledges the batch, so a
//! single event with unexpected field types must not fail decoding of the list;
//! accessors return `None` for anything absent or mistyped.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ListMeta;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::kind::TypeMeta;
use super::null_as_default;

/// Acknowledgment status returned for every accepted event list.
pub const EVENT_LIST_ACK_STATUS: &str = "OK";
/// Acknowledgment message returned for every accepted event list.
pub const EVENT_LIST_ACK_MESSAGE: &str = "EventListAccepted";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventList {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: ListMeta,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<Event>,
}

impl EventList {
    pub fn types(&self) -> TypeMeta {
        TypeMeta::new(self.api_version.clone(), self.kind.clone())
    }
}

/// A single audit event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(pub Value);

impl Event {
    fn str_at(&self, pointer: &str) -> Option<&str> {
        self.0.pointer(pointer).and_then(Value::as_str)
    }

    /// Field view used for structured logging.
    pub fn summary(&self) -> EventSummary<'_> {
        EventSummary {
            audit_id: self.str_at("/auditID"),
            level: self.str_at("/level"),
            stage: self.str_at("/stage"),
            verb: self.str_at("/verb"),
            request_uri: self.str_at("/requestURI"),
            username: self.str_at("/user/username"),
            namespace: self.str_at("/objectRef/namespace"),
            resource: self.str_at("/objectRef/resource"),
            name: self.str_at("/objectRef/name"),
            response_code: self
                .0
                .pointer("/responseStatus/code")
                .and_then(Value::as_i64),
        }
    }
}

/// Borrowed, best-effort view of the interesting audit event fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventSummary<'a> {
    pub audit_id: Option<&'a str>,
    pub level: Option<&'a str>,
    pub stage: Option<&'a str>,
    pub verb: Option<&'a str>,
    pub request_uri: Option<&'a str>,
    pub username: Option<&'a str>,
    pub namespace: Option<&'a str>,
    pub resource: Option<&'a str>,
    pub name: Option<&'a str>,
    pub response_code: Option<i64>,
}

/// Audit acknowledgment body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListAck {
    pub status: String,
    pub status_message: String,
}

impl EventListAck {
    /// The fixed acknowledgment sent for every event list.
    pub fn accepted() -> Self {
        Self {
            status: EVENT_LIST_ACK_STATUS.to_string(),
            status_message: EVENT_LIST_ACK_MESSAGE.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_reads_nested_fields() {
        let ev = Event(json!({
            "auditID": "a-1",
            "stage": "ResponseComplete",
            "verb": "get",
            "user": { "username": "alice" },
            "objectRef": { "namespace": "prod", "resource": "pods", "name": "web-0" },
            "responseStatus": { "code": 200 }
        }));
        let s = ev.summary();
        assert_eq!(s.audit_id, Some("a-1"));
        assert_eq!(s.username, Some("alice"));
        assert_eq!(s.namespace, Some("prod"));
        assert_eq!(s.name, Some("web-0"));
        assert_eq!(s.response_code, Some(200));
    }

    #[test]
    fn summary_tolerates_mistyped_fields() {
        let ev = Event(json!({ "auditID": 42, "user": "not-an-object", "verb": "list" }));
        let s = ev.summary();
        assert_eq!(s.audit_id, None);
        assert_eq!(s.username, None);
        assert_eq!(s.verb, Some("list"));

        assert_eq!(Event(json!(7)).summary(), EventSummary::default());
    }

    #[test]
    fn null_items_and_metadata_are_empty() {
        let list: EventList = serde_json::from_value(json!({
            "apiVersion": "audit.k8s.io/v1",
            "kind": "EventList",
            "metadata": null,
            "items": null
        }))
        .unwrap();
        assert!(list.items.is_empty());
        assert_eq!(list.metadata, ListMeta::default());
    }
}
