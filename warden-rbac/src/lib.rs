//! Permission resolution and power-based authorization for Warden.
//!
//! This crate is the decision core of the RBAC layer: given a user,
//! compute their effective permission set from their roles' tri-state
//! grants; given two actors, decide whether one may act on the other from
//! the strict ordering of role power.
//!
//! # Features
//!
//! - **Tri-state grants**: a role allows, denies, or has no vote on each
//!   permission; the most powerful role with any vote wins.
//! - **MFA gating**: a `requires_mfa` role contributes nothing until its
//!   bearer enables MFA.
//! - **Admin bypass**: admins hold the full current catalog; power
//!   ordering still applies to them.
//! - **Power-gated mutations**: editing, deleting, granting, and
//!   re-ranking roles all require strictly higher top power.
//! - **Cache with an invalidation contract**: resolution results are
//!   cached until a mutation invalidates them; a failing cache only ever
//!   costs a recomputation.
//! - **Fail-closed errors**: "denied" and "could not determine" stay
//!   distinct all the way to the enforcement boundary.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use warden_rbac::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let repo = Arc::new(MemoryRepository::new());
//!     let perms = repo.seed_permissions(&["articles.publish"]).await;
//!
//!     let engine = AccessEngine::builder()
//!         .with_repository(repo.clone())
//!         .with_audit_logging(true)
//!         .build()?;
//!
//!     let editor = Role::new("editor")
//!         .with_power(5)
//!         .with_grant(perms[0].clone(), true);
//!     repo.save_role(&editor).await?;
//!
//!     let alice = User::new("alice", "alice@example.com").with_role(editor);
//!     repo.save_user(&alice).await?;
//!
//!     let can_publish = engine
//!         .guard()
//!         .has_permission(alice.id, &"articles.publish".into())
//!         .await?;
//!     assert!(can_publish);
//!
//!     engine.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod guard;
pub mod management;
pub mod power;
pub mod resolver;

pub mod prelude {
    //! Common imports for Warden RBAC

    pub use crate::config::{CacheConfig, WardenConfig};
    pub use crate::engine::{AccessEngine, AccessEngineBuilder};
    pub use crate::guard::{AccessGuard, Target};
    pub use crate::management::{GrantChange, Management, NewRole, RoleChange};
    pub use crate::power::PowerAuthority;
    pub use crate::resolver::PermissionResolver;

    // Re-export the core entity and storage types
    pub use warden_core::prelude::*;
}

// Re-export major components at crate level
pub use engine::AccessEngine;
pub use guard::AccessGuard;
pub use management::Management;
pub use power::PowerAuthority;
pub use resolver::PermissionResolver;
pub use warden_core::{Error, Result};
