//! Users and their role membership.

use super::role::{Role, RoleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// An authenticated subject.
///
/// The user exclusively owns its role-membership list; saving a user
/// persists exactly the membership it carries. Credentials, sessions, and
/// the MFA secret live with the surrounding auth flows — this type only
/// carries what authorization decisions read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Stable unique id.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Escape hatch: bypasses permission membership checks entirely.
    /// Power ordering still applies.
    pub is_admin: bool,
    /// Whether the user completed MFA enrollment. Read by resolution to
    /// gate `requires_mfa` roles; flipped only by the MFA setup flow.
    pub mfa_enabled: bool,
    pub(crate) roles: Vec<Role>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a regular user with no roles.
    pub fn new(username: &str, email: &str) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            username: username.to_string(),
            email: email.to_string(),
            is_admin: false,
            mfa_enabled: false,
            roles: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an administrator.
    pub fn admin(username: &str, email: &str) -> Self {
        let mut user = Self::new(username, email);
        user.is_admin = true;
        user
    }

    /// Mark MFA as enrolled, builder style.
    pub fn with_mfa_enabled(mut self) -> Self {
        self.mfa_enabled = true;
        self
    }

    /// Attach a role, builder style.
    pub fn with_role(mut self, role: Role) -> Self {
        self.add_role(role);
        self
    }

    /// Attach a role. Returns false when the user already holds it.
    pub fn add_role(&mut self, role: Role) -> bool {
        if self.has_role(role.id) {
            return false;
        }
        self.roles.push(role);
        true
    }

    /// Detach a role. Returns whether the user held it.
    pub fn remove_role(&mut self, role: RoleId) -> bool {
        let before = self.roles.len();
        self.roles.retain(|r| r.id != role);
        self.roles.len() != before
    }

    /// Whether the user holds the given role.
    pub fn has_role(&self, role: RoleId) -> bool {
        self.roles.iter().any(|r| r.id == role)
    }

    /// The user's role membership.
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Maximum power across the user's roles.
    ///
    /// `None` for a user with no roles — deliberately not 0, which could
    /// under- or over-authorize depending on the powers in play. Callers
    /// treat `None` as "may not act on anything power-gated".
    pub fn top_power(&self) -> Option<u32> {
        self.roles.iter().map(|r| r.power).max()
    }

    /// Roles whose grants participate in resolution: a `requires_mfa` role
    /// contributes nothing while the bearer has MFA disabled.
    pub fn active_roles(&self) -> impl Iterator<Item = &Role> {
        self.roles
            .iter()
            .filter(|r| !r.requires_mfa || self.mfa_enabled)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.id)
    }
}
