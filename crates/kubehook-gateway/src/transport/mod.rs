//! Transport layer (HTTP).
//!
//! Exposes the review endpoint handler and the latency middleware wrapped
//! around every route.

pub mod http;
pub mod latency;
