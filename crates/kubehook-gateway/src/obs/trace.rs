//! Request trace context.
//!
//! Propagation uses the W3C `traceparent` header
//! (`00-<32 hex trace id>-<16 hex parent id>-<2 hex flags>`). The context
//! carries the ids alongside the live `tracing::Span` of the current stage, so
//! each stage can open a child span and log the ids it belongs to.
//! Spans close when the last handle is dropped, which covers every exit path.

use axum::http::{HeaderMap, HeaderValue};
use tracing::Span;
use uuid::Uuid;

use kubehook_core::error::{KubehookError, Result};

pub const TRACEPARENT: &str = "traceparent";

const FLAG_SAMPLED: u8 = 0x01;

/// Span context received from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteParent {
    pub trace_id: u128,
    pub span_id: u64,
    pub sampled: bool,
}

/// Parse the inbound `traceparent` header.
///
/// `Ok(None)` when the caller sent none; `Err` when one was sent but is
/// unusable.
pub fn extract(headers: &HeaderMap) -> Result<Option<RemoteParent>> {
    let Some(raw) = headers.get(TRACEPARENT) else {
        return Ok(None);
    };
    let s = raw
        .to_str()
        .map_err(|_| KubehookError::TraceExtraction("traceparent is not ascii".into()))?;
    parse_traceparent(s.trim()).map(Some)
}

fn parse_traceparent(s: &str) -> Result<RemoteParent> {
    let bad = |why: &str| KubehookError::TraceExtraction(format!("{why}: {s:?}"));

    let mut parts = s.split('-');
    let (Some(version), Some(trace), Some(parent), Some(flags)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(bad("traceparent needs four fields"));
    };

    if version.len() != 2 || version.eq_ignore_ascii_case("ff") {
        return Err(bad("unsupported traceparent version"));
    }
    let version = u8::from_str_radix(version, 16).map_err(|_| bad("bad version"))?;
    // Version 00 has exactly four fields; later versions may append more.
    if version == 0 && parts.next().is_some() {
        return Err(bad("trailing data after flags"));
    }
    if trace.len() != 32 || parent.len() != 16 || flags.len() != 2 {
        return Err(bad("traceparent field length mismatch"));
    }

    let trace_id = u128::from_str_radix(trace, 16).map_err(|_| bad("bad trace id"))?;
    let span_id = u64::from_str_radix(parent, 16).map_err(|_| bad("bad parent id"))?;
    let flags = u8::from_str_radix(flags, 16).map_err(|_| bad("bad flags"))?;

    if trace_id == 0 || span_id == 0 {
        return Err(bad("all-zero trace or parent id"));
    }

    Ok(RemoteParent {
        trace_id,
        span_id,
        sampled: flags & FLAG_SAMPLED != 0,
    })
}

fn new_trace_id() -> u128 {
    Uuid::new_v4().as_u128()
}

fn new_span_id() -> u64 {
    // Low half of a v4 uuid always has the variant bit set, so it is nonzero.
    Uuid::new_v4().as_u128() as u64
}

/// Trace identity of the current pipeline stage.
#[derive(Debug, Clone)]
pub struct TraceContext {
    trace_id: u128,
    span_id: u64,
    parent_span_id: Option<u64>,
    sampled: bool,
    span: Span,
}

impl TraceContext {
    /// Root context for one request: continues the remote trace when present,
    /// otherwise starts a new one. `span` is the request's root span.
    pub fn root(parent: Option<RemoteParent>, span: Span) -> Self {
        match parent {
            Some(p) => Self {
                trace_id: p.trace_id,
                span_id: new_span_id(),
                parent_span_id: Some(p.span_id),
                sampled: p.sampled,
                span,
            },
            None => Self {
                trace_id: new_trace_id(),
                span_id: new_span_id(),
                parent_span_id: None,
                sampled: true,
                span,
            },
        }
    }

    /// Context for a nested stage running under `span`.
    pub fn child(&self, span: Span) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: new_span_id(),
            parent_span_id: Some(self.span_id),
            sampled: self.sampled,
            span,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn trace_id(&self) -> String {
        format!("{:032x}", self.trace_id)
    }

    pub fn span_id(&self) -> String {
        format!("{:016x}", self.span_id)
    }

    pub fn parent_span_id(&self) -> Option<String> {
        self.parent_span_id.map(|id| format!("{id:016x}"))
    }

    /// `traceparent` naming this stage, for propagation to the caller.
    pub fn traceparent(&self) -> String {
        format!(
            "00-{:032x}-{:016x}-{:02x}",
            self.trace_id,
            self.span_id,
            if self.sampled { FLAG_SAMPLED } else { 0 }
        )
    }

    pub fn traceparent_header(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.traceparent()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    fn headers(v: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(TRACEPARENT, HeaderValue::from_str(v).unwrap());
        h
    }

    #[test]
    fn extracts_w3c_sample() {
        let p = extract(&headers(SAMPLE)).unwrap().unwrap();
        assert_eq!(p.trace_id, 0x4bf92f3577b34da6a3ce929d0e0e4736);
        assert_eq!(p.span_id, 0x00f067aa0ba902b7);
        assert!(p.sampled);
    }

    #[test]
    fn missing_header_is_not_an_error() {
        assert_eq!(extract(&HeaderMap::new()).unwrap(), None);
    }

    #[test]
    fn rejects_malformed_headers() {
        for bad in [
            "garbage",
            "ff-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01",
            "00-4bf92f3577b34da6a3ce929d0e0e473-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01-extra",
        ] {
            let err = extract(&headers(bad)).unwrap_err();
            assert!(matches!(err, KubehookError::TraceExtraction(_)), "input={bad}");
        }
    }

    #[test]
    fn root_continues_remote_trace() {
        let p = extract(&headers(SAMPLE)).unwrap();
        let root = TraceContext::root(p, Span::none());
        assert_eq!(root.trace_id(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(root.parent_span_id().as_deref(), Some("00f067aa0ba902b7"));
        assert_ne!(root.span_id(), "00f067aa0ba902b7");

        let child = root.child(Span::none());
        assert_eq!(child.trace_id(), root.trace_id());
        assert_eq!(child.parent_span_id(), Some(root.span_id()));
        assert!(child.traceparent().starts_with("00-4bf92f3577b34da6a3ce929d0e0e4736-"));
        assert!(child.traceparent().ends_with("-01"));
    }

    #[test]
    fn fresh_root_has_no_parent() {
        let root = TraceContext::root(None, Span::none());
        assert_eq!(root.parent_span_id(), None);
        assert_eq!(root.trace_id().len(), 32);
        assert!(parse_traceparent(&root.traceparent()).is_ok());
    }
}
