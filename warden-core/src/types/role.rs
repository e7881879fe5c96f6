//! Roles and their tri-state permission grants.

use super::permission::{Permission, PermissionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RoleId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A role's explicit stance on one permission.
///
/// Absence of a grant is not the same thing as a grant with
/// `allowed = false`. Both resolve to "not granted" on their own, but only
/// the explicit deny takes part in power-ordered resolution, where it can
/// out-rank a weaker role's allow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleGrant {
    /// The permission this stance is about.
    pub permission: Permission,
    /// The stance: allow or deny.
    pub allowed: bool,
    /// When the stance was recorded.
    pub created_at: DateTime<Utc>,
}

impl RoleGrant {
    /// Record a stance on a permission.
    pub fn new(permission: Permission, allowed: bool) -> Self {
        Self {
            permission,
            allowed,
            created_at: Utc::now(),
        }
    }
}

/// A named bundle of grants with an authority ranking.
///
/// `power` strictly orders roles: an actor needs strictly higher top power
/// to modify, delete, or assign a role. The grant list holds at most one
/// entry per permission; [`Role::set_grant`] replaces an existing stance
/// rather than appending a second one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    /// Stable unique id.
    pub id: RoleId,
    /// Unique name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Authority ranking; higher number means more authority.
    pub power: u32,
    /// When set, the role's grants are inert for bearers without MFA enabled.
    pub requires_mfa: bool,
    /// Assigned to newly registered users.
    pub is_default: bool,
    pub(crate) grants: Vec<RoleGrant>,
}

impl Role {
    /// Create a role with the default power of 1 and no grants.
    pub fn new(name: &str) -> Self {
        Self {
            id: RoleId::new(),
            name: name.to_string(),
            description: String::new(),
            power: 1,
            requires_mfa: false,
            is_default: false,
            grants: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Set the power ranking.
    pub fn with_power(mut self, power: u32) -> Self {
        self.power = power;
        self
    }

    /// Mark the role as inert for bearers without MFA.
    pub fn requiring_mfa(mut self) -> Self {
        self.requires_mfa = true;
        self
    }

    /// Mark the role as assigned to new users by default.
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Add or replace a stance on a permission, builder style.
    pub fn with_grant(mut self, permission: Permission, allowed: bool) -> Self {
        self.set_grant(permission, allowed);
        self
    }

    /// Add or replace the stance on a permission.
    pub fn set_grant(&mut self, permission: Permission, allowed: bool) {
        if let Some(existing) = self
            .grants
            .iter_mut()
            .find(|g| g.permission.id == permission.id)
        {
            existing.allowed = allowed;
        } else {
            self.grants.push(RoleGrant::new(permission, allowed));
        }
    }

    /// Remove the stance on a permission, returning whether one existed.
    ///
    /// A cleared grant is "no vote": the role no longer participates in
    /// resolution for that permission at all.
    pub fn clear_grant(&mut self, permission: PermissionId) -> bool {
        let before = self.grants.len();
        self.grants.retain(|g| g.permission.id != permission);
        self.grants.len() != before
    }

    /// The stance on a permission, if the role has one.
    pub fn grant_for(&self, permission: PermissionId) -> Option<&RoleGrant> {
        self.grants.iter().find(|g| g.permission.id == permission)
    }

    /// All recorded stances.
    pub fn grants(&self) -> &[RoleGrant] {
        &self.grants
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (power {})", self.name, self.power)
    }
}
