//! Dispatcher module exports.
//!
//! Re-exports the dispatcher, registry, and processor trait so downstream
//! consumers can depend on this module directly.

pub mod dispatcher;
pub mod registry;

pub use dispatcher::{DispatchError, Dispatcher, ProcessingOutcome, ReviewProcessor};
pub use registry::Registry;
