//! Admin management surface.
//!
//! Role and user mutations behind combined capability + power checks.
//! Every operation runs the same sequence: authorize, mutate, then
//! synchronously invalidate the cached permission sets of every affected
//! user — the mutation is not complete until the invalidation ran.
//!
//! Membership and grant edits are best-effort by contract, not
//! all-or-nothing: deltas the actor is not entitled to apply are skipped
//! silently, the rest go through. Callers must not assume a rejected delta
//! fails the whole batch.

use crate::guard::{AccessGuard, Target};
use crate::resolver::PermissionResolver;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info};
use warden_core::repository::{PermissionRepository, RoleRepository, UserRepository};
use warden_core::types::{
    AdminPermissions, PermissionId, PermissionRef, Role, RoleId, User, UserId,
};
use warden_core::{Error, Result};

/// Parameters for [`Management::create_role`].
#[derive(Debug, Clone)]
pub struct NewRole {
    /// Unique role name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Power ranking; must be strictly under the actor's top power.
    pub power: u32,
    /// Whether the role's grants are inert without MFA.
    pub requires_mfa: bool,
    /// Whether new users get this role.
    pub is_default: bool,
}

impl NewRole {
    /// A role spec with the default power of 1.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            power: 1,
            requires_mfa: false,
            is_default: false,
        }
    }

    /// Set the power ranking.
    pub fn with_power(mut self, power: u32) -> Self {
        self.power = power;
        self
    }
}

/// One tri-state grant edit. `allowed = None` clears the role's stance on
/// the permission entirely (back to "no vote").
#[derive(Debug, Clone)]
pub struct GrantChange {
    /// The permission whose stance changes.
    pub permission: PermissionId,
    /// Allow, deny, or clear.
    pub allowed: Option<bool>,
}

/// One membership edit for [`Management::set_user_roles`].
#[derive(Debug, Clone)]
pub struct RoleChange {
    /// The role to add or remove.
    pub role: RoleId,
    /// Whether the target should hold it afterwards.
    pub member: bool,
}

/// Role and user mutation operations.
pub struct Management {
    guard: Arc<AccessGuard>,
    resolver: Arc<PermissionResolver>,
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    permissions: Arc<dyn PermissionRepository>,
}

impl Management {
    /// Wire the management surface to its collaborators.
    pub fn new(
        guard: Arc<AccessGuard>,
        resolver: Arc<PermissionResolver>,
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        permissions: Arc<dyn PermissionRepository>,
    ) -> Self {
        Self {
            guard,
            resolver,
            users,
            roles,
            permissions,
        }
    }

    /// Create a role. The assigned power must be strictly under the
    /// actor's top power, so nobody can mint a role at or above their own
    /// rank.
    pub async fn create_role(&self, actor: UserId, spec: NewRole) -> Result<Role> {
        self.authorize(actor, AdminPermissions::ROLES_CREATE, &Target::Power(spec.power))
            .await?;

        if self.roles.role_by_name(&spec.name).await?.is_some() {
            return Err(Error::conflict(format!("role name '{}' is taken", spec.name)));
        }

        let mut role = Role::new(&spec.name)
            .with_description(&spec.description)
            .with_power(spec.power);
        if spec.requires_mfa {
            role = role.requiring_mfa();
        }
        if spec.is_default {
            role = role.as_default();
        }

        self.roles.save_role(&role).await?;
        info!(actor = %actor, role = %role.id, name = %role.name, "Role created");
        Ok(role)
    }

    /// Rename a role. Resolution does not depend on role names, so no
    /// cache invalidation is needed here.
    pub async fn rename_role(&self, actor: UserId, role_id: RoleId, name: &str) -> Result<Role> {
        self.authorize(actor, AdminPermissions::ROLES_EDIT_NAME, &Target::Role(role_id))
            .await?;

        if let Some(existing) = self.roles.role_by_name(name).await?
            && existing.id != role_id
        {
            return Err(Error::conflict(format!("role name '{name}' is taken")));
        }

        let mut role = self.require_role(role_id).await?;
        role.name = name.to_string();
        self.roles.save_role(&role).await?;
        info!(actor = %actor, role = %role.id, "Role renamed");
        Ok(role)
    }

    /// Re-rank a role. Both the role's current power and the new value
    /// must sit strictly under the actor's top power.
    pub async fn set_role_power(&self, actor: UserId, role_id: RoleId, power: u32) -> Result<Role> {
        self.authorize(
            actor,
            AdminPermissions::ROLES_EDIT_POWER,
            &Target::RolePower {
                role: role_id,
                new_power: power,
            },
        )
        .await?;

        let mut role = self.require_role(role_id).await?;
        role.power = power;
        self.roles.save_role(&role).await?;
        self.invalidate_members(role_id).await?;
        info!(actor = %actor, role = %role.id, power, "Role power changed");
        Ok(role)
    }

    /// Flip a role's MFA requirement.
    pub async fn set_role_mfa_requirement(
        &self,
        actor: UserId,
        role_id: RoleId,
        requires_mfa: bool,
    ) -> Result<Role> {
        self.authorize(actor, AdminPermissions::ROLES_EDIT_MFA, &Target::Role(role_id))
            .await?;

        let mut role = self.require_role(role_id).await?;
        role.requires_mfa = requires_mfa;
        self.roles.save_role(&role).await?;
        self.invalidate_members(role_id).await?;
        info!(actor = %actor, role = %role.id, requires_mfa, "Role MFA requirement changed");
        Ok(role)
    }

    /// Edit a role's grants, best-effort.
    ///
    /// A change is applied only when the actor itself holds the referenced
    /// permission; changes to permissions outside the actor's own effective
    /// set, and changes referencing unknown permissions, are skipped
    /// silently. Admin actors hold everything and can edit any grant.
    pub async fn set_role_grants(
        &self,
        actor: UserId,
        role_id: RoleId,
        changes: Vec<GrantChange>,
    ) -> Result<Role> {
        self.authorize(actor, AdminPermissions::ROLES_EDIT_GRANTS, &Target::Role(role_id))
            .await?;

        let mut role = self.require_role(role_id).await?;
        let actor_permissions = self.resolver.resolve(actor).await?;

        for change in changes {
            let Some(permission) = self.permissions.find_permission(change.permission).await?
            else {
                debug!(permission = %change.permission, "Skipping grant edit for unknown permission");
                continue;
            };
            if !actor_permissions.iter().any(|p| p.id == permission.id) {
                debug!(
                    actor = %actor,
                    permission = %permission.name,
                    "Skipping grant edit outside the actor's own permissions"
                );
                continue;
            }
            match change.allowed {
                Some(allowed) => role.set_grant(permission, allowed),
                None => {
                    role.clear_grant(permission.id);
                }
            }
        }

        self.roles.save_role(&role).await?;
        self.invalidate_members(role_id).await?;
        info!(actor = %actor, role = %role.id, "Role grants updated");
        Ok(role)
    }

    /// Delete a role and detach it from every member.
    pub async fn delete_role(&self, actor: UserId, role_id: RoleId) -> Result<()> {
        self.authorize(actor, AdminPermissions::ROLES_DELETE, &Target::Role(role_id))
            .await?;

        let members = self.users.ids_with_role(role_id).await?;
        self.roles.delete_role(role_id).await?;
        join_all(members.iter().map(|id| self.resolver.invalidate(*id))).await;
        info!(actor = %actor, role = %role_id, "Role deleted");
        Ok(())
    }

    /// Edit a user's role membership, best-effort.
    ///
    /// Each delta is applied only when the role's power is strictly under
    /// the actor's top power; deltas at or above it silently keep the
    /// current state instead of failing the batch. Admin targets are
    /// untouchable.
    pub async fn set_user_roles(
        &self,
        actor: UserId,
        user_id: UserId,
        changes: Vec<RoleChange>,
    ) -> Result<User> {
        self.require_capability(actor, AdminPermissions::USERS_EDIT_ROLES)
            .await?;

        let mut user = self.require_user(user_id).await?;
        if user.is_admin {
            return Err(Error::denied("target user is an administrator"));
        }

        let actor_top = match self
            .users
            .find_with_roles(actor)
            .await?
            .and_then(|u| u.top_power())
        {
            Some(top) => top,
            // A roleless actor out-ranks nothing; every delta is skipped.
            None => {
                debug!(actor = %actor, "Membership edit by actor with no roles is a no-op");
                return Ok(user);
            }
        };

        for change in changes {
            let Some(role) = self.roles.find_role(change.role).await? else {
                debug!(role = %change.role, "Skipping membership edit for unknown role");
                continue;
            };
            if role.power >= actor_top {
                debug!(
                    actor = %actor,
                    role = %role.name,
                    "Skipping membership edit at or above the actor's power"
                );
                continue;
            }
            if change.member {
                user.add_role(role);
            } else {
                user.remove_role(role.id);
            }
        }

        self.users.save_user(&user).await?;
        self.resolver.invalidate(user_id).await;
        info!(actor = %actor, user = %user_id, "User roles updated");
        Ok(user)
    }

    /// Delete a user. Self-deletion and admin targets are refused; the
    /// target's top power must be strictly under the actor's.
    pub async fn delete_user(&self, actor: UserId, user_id: UserId) -> Result<()> {
        if actor == user_id {
            return Err(Error::denied("you can not delete yourself"));
        }

        let target = self.require_user(user_id).await?;
        if target.is_admin {
            return Err(Error::denied("target user is an administrator"));
        }

        self.authorize(actor, AdminPermissions::USERS_DELETE, &Target::User(user_id))
            .await?;

        self.users.delete_user(user_id).await?;
        self.resolver.invalidate(user_id).await;
        info!(actor = %actor, user = %user_id, "User deleted");
        Ok(())
    }

    /// Combined capability + power gate. Any indeterminate outcome
    /// propagates as an error; the caller never proceeds on one.
    async fn authorize(&self, actor: UserId, capability: &str, target: &Target) -> Result<()> {
        if self
            .guard
            .may_act_on(actor, &PermissionRef::from(capability), target)
            .await?
        {
            Ok(())
        } else {
            Err(Error::denied(format!("{capability} on {target:?}")))
        }
    }

    /// Capability gate without a power leg.
    async fn require_capability(&self, actor: UserId, capability: &str) -> Result<()> {
        if self
            .guard
            .has_permission(actor, &PermissionRef::from(capability))
            .await?
        {
            Ok(())
        } else {
            Err(Error::denied(capability))
        }
    }

    async fn require_role(&self, role_id: RoleId) -> Result<Role> {
        self.roles
            .find_role(role_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("role {role_id}")))
    }

    async fn require_user(&self, user_id: UserId) -> Result<User> {
        self.users
            .find_with_roles(user_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {user_id}")))
    }

    /// Invalidate every member of a role, synchronously, before the
    /// mutation's result becomes observable.
    async fn invalidate_members(&self, role_id: RoleId) -> Result<()> {
        let members = self.users.ids_with_role(role_id).await?;
        join_all(members.iter().map(|id| self.resolver.invalidate(*id))).await;
        Ok(())
    }
}
