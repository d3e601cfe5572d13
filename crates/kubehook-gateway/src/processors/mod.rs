//! Built-in review processors, one per review kind.
//!
//! Every processor counts its invocations, runs inside a child span named
//! after the operation, and logs a one-line summary of the decision. Policy is
//! a fixed default-allow; only structurally broken admission objects are denied.

pub mod admission;
pub mod audit;
pub mod authorization;

pub use admission::AdmissionProcessor;
pub use audit::AuditProcessor;
pub use authorization::{AuthorizationProcessor, DEFAULT_ALLOW_REASON};
