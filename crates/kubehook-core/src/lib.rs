//! kubehook core: wire types, review kinds, envelopes, and error types.
//!
//! This crate defines the JSON contracts exchanged with the Kubernetes API
//! server (admission reviews, subject access reviews, audit event lists) and
//! the error surface shared by the gateway. It carries no transport or runtime
//! dependencies so it can be reused by tooling and tests.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed webhook payloads must surface as `KubehookError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod review;

pub use error::{Result, KubehookError};
