//! Persistence contracts.
//!
//! The engine never talks to a database directly; it consumes these narrow
//! traits. Implementations are expected to serialize mutations per affected
//! entity and to enforce bounded timeouts — a hung backend must surface as
//! [`Error::Unavailable`](crate::Error::Unavailable), not a stuck future.

use crate::Result;
use crate::types::{Permission, PermissionId, Role, RoleId, User, UserId};
use async_trait::async_trait;

/// Storage for users and their role membership.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Load a user with roles and each role's grants eagerly attached, in
    /// one logically-consistent read — resolution must never observe a
    /// half-updated role.
    async fn find_with_roles(&self, id: UserId) -> Result<Option<User>>;

    /// Persist a user. The membership the user carries is authoritative:
    /// saving replaces the stored role list.
    async fn save_user(&self, user: &User) -> Result<()>;

    /// Remove a user.
    async fn delete_user(&self, id: UserId) -> Result<()>;

    /// Ids of every user holding the given role. Used to fan out cache
    /// invalidation when a role changes under its members.
    async fn ids_with_role(&self, role: RoleId) -> Result<Vec<UserId>>;
}

/// Storage for roles and their grant lists.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Load a role with its grants.
    async fn find_role(&self, id: RoleId) -> Result<Option<Role>>;

    /// Look a role up by its unique name.
    async fn role_by_name(&self, name: &str) -> Result<Option<Role>>;

    /// All roles.
    async fn all_roles(&self) -> Result<Vec<Role>>;

    /// Persist a role. The grant list the role carries is authoritative.
    async fn save_role(&self, role: &Role) -> Result<()>;

    /// Remove a role, detaching it from every user that holds it.
    async fn delete_role(&self, id: RoleId) -> Result<()>;
}

/// Storage for the permission catalog.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Load one permission.
    async fn find_permission(&self, id: PermissionId) -> Result<Option<Permission>>;

    /// Look a permission up by its unique name.
    async fn permission_by_name(&self, name: &str) -> Result<Option<Permission>>;

    /// The full current catalog. This is what an admin's effective set is.
    async fn all_permissions(&self) -> Result<Vec<Permission>>;

    /// Persist a permission. Only seeding and the (out of scope) catalog
    /// admin surface call this.
    async fn save_permission(&self, permission: &Permission) -> Result<()>;
}
