//! Effective-permission resolution.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use warden_core::Result;
use warden_core::cache::CacheStore;
use warden_core::repository::{PermissionRepository, UserRepository};
use warden_core::types::{Permission, PermissionId, Role, RoleGrant, User, UserId};

fn cache_key(user: UserId) -> String {
    format!("user-permissions-{user}")
}

/// Computes a user's effective permission set from their roles' grants.
///
/// Resolution is read-only and idempotent; concurrent calls for the same
/// user during a cache miss may recompute redundantly, which is harmless.
/// The cache is consulted first and written last, and a cache that
/// misbehaves only ever costs a recomputation — never a wrong answer.
pub struct PermissionResolver {
    users: Arc<dyn UserRepository>,
    permissions: Arc<dyn PermissionRepository>,
    cache: Arc<dyn CacheStore>,
}

impl PermissionResolver {
    /// Wire a resolver to its collaborators.
    pub fn new(
        users: Arc<dyn UserRepository>,
        permissions: Arc<dyn PermissionRepository>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            users,
            permissions,
            cache,
        }
    }

    /// Resolve the effective permission set for a user.
    ///
    /// - An admin resolves to the full current catalog, whatever their
    ///   roles say.
    /// - A `requires_mfa` role contributes nothing while the user has MFA
    ///   disabled.
    /// - Surviving roles' grants are walked from the most powerful role
    ///   down; the first stance seen per permission — allow or deny —
    ///   fixes it. Permissions fixed to allow form the result.
    /// - An unknown user resolves to the empty set.
    ///
    /// The returned list is de-duplicated; its ordering is unspecified.
    pub async fn resolve(&self, user_id: UserId) -> Result<Vec<Permission>> {
        let key = cache_key(user_id);
        if let Some(value) = self.cache.get(&key).await {
            match serde_json::from_value::<Vec<Permission>>(value) {
                Ok(permissions) => return Ok(permissions),
                // A corrupt entry is a miss; recompute below.
                Err(e) => warn!(user = %user_id, error = %e, "Discarding unreadable cache entry"),
            }
        }

        let Some(user) = self.users.find_with_roles(user_id).await? else {
            debug!(user = %user_id, "Resolving permissions for unknown user");
            return Ok(Vec::new());
        };

        let resolved = if user.is_admin {
            self.permissions.all_permissions().await?
        } else {
            resolve_grants(&user)
        };

        match serde_json::to_value(&resolved) {
            // Resolved entries carry no TTL: invalidation, not expiry, is
            // what keeps them correct.
            Ok(value) => self.cache.set(&key, value, None).await,
            Err(e) => warn!(user = %user_id, error = %e, "Failed to serialize permissions for caching"),
        }

        Ok(resolved)
    }

    /// Drop the cached set for a user.
    ///
    /// Every mutation that can change a resolution outcome — role
    /// membership, a role's grants, a role's power or MFA flag — calls this
    /// synchronously before its result is observable to other callers.
    pub async fn invalidate(&self, user_id: UserId) {
        self.cache.invalidate(&cache_key(user_id)).await;
    }
}

/// Power-ordered tri-state grant resolution for a non-admin user.
///
/// Ties in power are broken by role id, ascending, so repeated calls over
/// the same data stay deterministic. Which of two equal-power roles wins is
/// not a guaranteed contract.
fn resolve_grants(user: &User) -> Vec<Permission> {
    let mut ranked: Vec<&Role> = user.active_roles().collect();
    ranked.sort_by(|a, b| b.power.cmp(&a.power).then(a.id.cmp(&b.id)));

    let mut stance: HashMap<PermissionId, &RoleGrant> = HashMap::new();
    for role in ranked {
        for grant in role.grants() {
            stance.entry(grant.permission.id).or_insert(grant);
        }
    }

    stance
        .into_values()
        .filter(|grant| grant.allowed)
        .map(|grant| grant.permission.clone())
        .collect()
}
