//! # Warden Core
//!
//! Entities, error taxonomy, and storage contracts for the Warden RBAC
//! engine.
//!
//! This crate holds everything the resolution and authorization logic in
//! `warden-rbac` consumes: the user/role/permission model with tri-state
//! grants, the swappable [`cache::CacheStore`] contract, the repository
//! traits persistence implementations plug into, and the in-memory
//! implementations used by tests and single-process deployments.
//!
//! ## API Stability
//!
//! **Current Status: EXPERIMENTAL (v0.x.x)**
//!
//! During the 0.x.x series minor version bumps may include breaking
//! changes; patch bumps will stay backward compatible.

#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod memory;
pub mod repository;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Common imports for Warden Core consumers.
pub mod prelude {
    pub use crate::cache::{CacheStore, MemoryCache};
    pub use crate::error::{Error, Result};
    pub use crate::memory::MemoryRepository;
    pub use crate::repository::{PermissionRepository, RoleRepository, UserRepository};
    pub use crate::types::*;
}
