//! Top-level facade crate for kubehook.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use kubehook_core::*;
}

pub mod gateway {
    pub use kubehook_gateway::*;
}
