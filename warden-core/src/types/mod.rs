//! Entity types for the Warden RBAC engine.
//!
//! The ownership rules are deliberate: a [`User`] exclusively owns its role
//! membership, a [`Role`] exclusively owns its grant list, and nothing owns a
//! [`Permission`] — it is referenced by id from grants. Derived data (the
//! effective permission set) is never stored on these types; it lives in the
//! cache and is reconstructible from them.

pub mod permission;
pub mod role;
pub mod user;

pub use permission::{AdminPermissions, Permission, PermissionId, PermissionRef};
pub use role::{Role, RoleGrant, RoleId};
pub use user::{User, UserId};
