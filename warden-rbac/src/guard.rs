//! Composable authorization predicates.
//!
//! The guard answers two questions: "does this actor hold a capability" and
//! "may this actor act on that target". Both are pure reads with no side
//! effects. Failures from collaborators are never folded into a boolean —
//! they surface as errors so the enforcement boundary can tell "denied"
//! apart from "could not determine" and fail closed on the latter.

use crate::power::PowerAuthority;
use crate::resolver::PermissionResolver;
use std::sync::Arc;
use tracing::{debug, info, warn};
use warden_core::repository::{RoleRepository, UserRepository};
use warden_core::types::{PermissionRef, RoleId, UserId};
use warden_core::{Error, Result};

/// The target of a privileged mutation, for combined capability + power
/// checks.
#[derive(Debug, Clone)]
pub enum Target {
    /// An existing role (rename, grant edits, MFA flag, deletion).
    Role(RoleId),
    /// A power value about to be assigned (role creation).
    Power(u32),
    /// An existing role together with a new power value for it.
    RolePower {
        /// The role being re-ranked.
        role: RoleId,
        /// The power value it would get.
        new_power: u32,
    },
    /// Another user (deletion).
    User(UserId),
}

/// Authorization guard over resolution and power ordering.
pub struct AccessGuard {
    resolver: Arc<PermissionResolver>,
    power: Arc<PowerAuthority>,
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    audit: bool,
}

impl AccessGuard {
    /// Wire a guard to its collaborators. With `audit` set, every decision
    /// is logged with its subject and outcome.
    pub fn new(
        resolver: Arc<PermissionResolver>,
        power: Arc<PowerAuthority>,
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        audit: bool,
    ) -> Self {
        Self {
            resolver,
            power,
            users,
            roles,
            audit,
        }
    }

    /// Does the user hold this permission?
    ///
    /// Admins hold everything. An unknown user holds nothing.
    pub async fn has_permission(
        &self,
        user_id: UserId,
        permission: &PermissionRef,
    ) -> Result<bool> {
        let Some(user) = self.users.find_with_roles(user_id).await? else {
            debug!(subject = %user_id, "Permission check for unknown user");
            return Ok(false);
        };

        let granted = if user.is_admin {
            true
        } else {
            let resolved = self.resolver.resolve(user_id).await?;
            resolved.iter().any(|p| permission.matches(p))
        };

        if self.audit {
            if granted {
                info!(
                    subject = %user_id,
                    permission = %permission,
                    result = "granted",
                    "Permission check"
                );
            } else {
                warn!(
                    subject = %user_id,
                    permission = %permission,
                    result = "denied",
                    "Permission check"
                );
            }
        }

        Ok(granted)
    }

    /// Does the user hold every listed permission?
    pub async fn require_all(
        &self,
        user_id: UserId,
        permissions: &[PermissionRef],
    ) -> Result<bool> {
        for permission in permissions {
            if !self.has_permission(user_id, permission).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// May the actor perform a `capability`-gated action on `target`?
    ///
    /// Both legs must pass: the base capability (admins bypass this leg
    /// only) and the power-ordering rule for the specific target. A missing
    /// target role or user is an error — deciding about a ghost is always
    /// deny, and the caller should know why.
    pub async fn may_act_on(
        &self,
        actor: UserId,
        capability: &PermissionRef,
        target: &Target,
    ) -> Result<bool> {
        if !self.has_permission(actor, capability).await? {
            return Ok(false);
        }

        let out_ranks = match target {
            Target::Role(role_id) => {
                let role = self
                    .roles
                    .find_role(*role_id)
                    .await?
                    .ok_or_else(|| Error::not_found(format!("role {role_id}")))?;
                self.power.may_modify_role(actor, &role).await?
            }
            Target::Power(power) => self.power.may_assign_power(actor, *power).await?,
            Target::RolePower { role, new_power } => {
                let role = self
                    .roles
                    .find_role(*role)
                    .await?
                    .ok_or_else(|| Error::not_found(format!("role {role}")))?;
                self.power.may_modify_role(actor, &role).await?
                    && self.power.may_assign_power(actor, *new_power).await?
            }
            Target::User(user_id) => self.power.may_act_on_user(actor, *user_id).await?,
        };

        if self.audit && !out_ranks {
            warn!(
                subject = %actor,
                capability = %capability,
                target = ?target,
                result = "denied (power)",
                "Target check"
            );
        }

        Ok(out_ranks)
    }
}
