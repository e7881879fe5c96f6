//! # Warden - Role-Based Access Control for Rust
//!
//! A role-based access control engine with power-ranked roles, tri-state
//! permission grants, and MFA-gated privilege escalation.
//!
//! This crate re-exports the core functionality from the constituent crates:
//! - `warden-core`: Entities, error taxonomy, and storage contracts
//! - `warden-rbac`: Resolution, power authority, guard, and management surface

pub use warden_core as core;
pub use warden_rbac as rbac;

/// Re-export commonly used items
pub mod prelude {
    #[allow(unused_imports)]
    pub use crate::core::prelude::*;
    pub use crate::rbac::prelude::*;
}
