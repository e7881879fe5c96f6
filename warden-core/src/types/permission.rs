//! Permission catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a permission.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PermissionId(Uuid);

impl PermissionId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PermissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PermissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PermissionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A named capability.
///
/// Permissions are never created implicitly by engine code; the fixed set the
/// application relies on is seeded at process start. A name that was never
/// seeded resolves as "never granted" everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    /// Stable unique id.
    pub id: PermissionId,
    /// Unique human-readable name, e.g. `admin.roles.edit-power`.
    pub name: String,
    /// Free-form description shown in the admin surface.
    pub description: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    /// Create a permission with a fresh id.
    pub fn new(name: &str, description: &str) -> Self {
        let now = Utc::now();
        Self {
            id: PermissionId::new(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Comparison key for permission checks.
///
/// Callers hold permissions either as names (seeded constants) or as ids
/// (decoded from a request); the same guard logic serves both instead of
/// taking a comparator callback across the API boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PermissionRef {
    /// Compare by unique name.
    Name(String),
    /// Compare by id.
    Id(PermissionId),
}

impl PermissionRef {
    /// True when this reference denotes the given permission.
    pub fn matches(&self, permission: &Permission) -> bool {
        match self {
            PermissionRef::Name(name) => permission.name == *name,
            PermissionRef::Id(id) => permission.id == *id,
        }
    }
}

impl From<&str> for PermissionRef {
    fn from(name: &str) -> Self {
        PermissionRef::Name(name.to_string())
    }
}

impl From<PermissionId> for PermissionRef {
    fn from(id: PermissionId) -> Self {
        PermissionRef::Id(id)
    }
}

impl fmt::Display for PermissionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionRef::Name(name) => write!(f, "{}", name),
            PermissionRef::Id(id) => write!(f, "{}", id),
        }
    }
}

/// Names of the permissions the admin management surface is seeded with.
pub struct AdminPermissions;

impl AdminPermissions {
    /// List and search users.
    pub const USERS_VIEW: &'static str = "admin.users.view";
    /// Edit another user's role membership.
    pub const USERS_EDIT_ROLES: &'static str = "admin.users.edit-roles";
    /// Delete a user.
    pub const USERS_DELETE: &'static str = "admin.users.delete";

    /// List and search roles.
    pub const ROLES_VIEW: &'static str = "admin.roles.view";
    /// Create a role.
    pub const ROLES_CREATE: &'static str = "admin.roles.create";
    /// Rename a role.
    pub const ROLES_EDIT_NAME: &'static str = "admin.roles.edit-name";
    /// Re-rank a role.
    pub const ROLES_EDIT_POWER: &'static str = "admin.roles.edit-power";
    /// Flip a role's MFA requirement.
    pub const ROLES_EDIT_MFA: &'static str = "admin.roles.edit-mfa";
    /// Edit a role's grants.
    pub const ROLES_EDIT_GRANTS: &'static str = "admin.roles.edit-grants";
    /// Delete a role.
    pub const ROLES_DELETE: &'static str = "admin.roles.delete";

    /// View the permission catalog.
    pub const PERMISSIONS_VIEW: &'static str = "admin.permissions.view";

    /// The full seed set, in a stable order.
    pub fn all() -> &'static [&'static str] {
        &[
            Self::USERS_VIEW,
            Self::USERS_EDIT_ROLES,
            Self::USERS_DELETE,
            Self::ROLES_VIEW,
            Self::ROLES_CREATE,
            Self::ROLES_EDIT_NAME,
            Self::ROLES_EDIT_POWER,
            Self::ROLES_EDIT_MFA,
            Self::ROLES_EDIT_GRANTS,
            Self::ROLES_DELETE,
            Self::PERMISSIONS_VIEW,
        ]
    }
}
