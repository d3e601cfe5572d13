//! Observability: in-process metrics and request trace context.
//!
//! Metrics are stored as atomics and rendered by the `/metrics` handler.
//! Trace contexts are created per request by the transport layer and passed
//! down explicitly; nothing here is a process-wide singleton.

pub mod metrics;
pub mod trace;

pub use metrics::GatewayMetrics;
pub use trace::TraceContext;
