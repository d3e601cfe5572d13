//! kubehook gateway library entry.
//!
//! This crate wires the HTTP transport, dispatcher, review processors, and
//! observability into the webhook receiver. It is intended to be consumed by
//! the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod obs;
pub mod ops;
pub mod processors;
pub mod router;
pub mod transport;
