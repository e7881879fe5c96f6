//! In-memory repository.
//!
//! Backs tests and single-process deployments. A single lock over all three
//! tables gives [`UserRepository::find_with_roles`] its required
//! logically-consistent snapshot for free, and serializes mutations per
//! process. Nothing here can be unavailable, so every method returns `Ok`.

use crate::Result;
use crate::repository::{PermissionRepository, RoleRepository, UserRepository};
use crate::types::{Permission, PermissionId, Role, RoleId, User, UserId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

struct UserRecord {
    /// Stored with an empty role list; membership lives in `role_ids`.
    user: User,
    role_ids: Vec<RoleId>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, UserRecord>,
    roles: HashMap<RoleId, Role>,
    permissions: HashMap<PermissionId, Permission>,
}

/// In-memory implementation of all three repository contracts.
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Seed the fixed permission catalog. Idempotent: names that already
    /// exist are returned as stored, not recreated.
    pub async fn seed_permissions(&self, names: &[&str]) -> Vec<Permission> {
        let mut tables = self.tables.write().await;
        names
            .iter()
            .map(|name| {
                if let Some(existing) =
                    tables.permissions.values().find(|p| p.name == **name)
                {
                    return existing.clone();
                }
                let permission = Permission::new(name, "");
                tables
                    .permissions
                    .insert(permission.id, permission.clone());
                permission
            })
            .collect()
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn find_with_roles(&self, id: UserId) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|record| {
            let mut user = record.user.clone();
            for role_id in &record.role_ids {
                if let Some(role) = tables.roles.get(role_id) {
                    user.add_role(role.clone());
                }
            }
            user
        }))
    }

    async fn save_user(&self, user: &User) -> Result<()> {
        let mut tables = self.tables.write().await;
        let role_ids: Vec<RoleId> = user.roles().iter().map(|r| r.id).collect();

        // Roles the user carries that were never saved individually are
        // inserted, but stored role state is never overwritten from here.
        for role in user.roles() {
            tables.roles.entry(role.id).or_insert_with(|| role.clone());
        }

        let mut stored = user.clone();
        stored.roles.clear();
        stored.updated_at = Utc::now();
        tables.users.insert(user.id, UserRecord {
            user: stored,
            role_ids,
        });
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.users.remove(&id) {
            Some(_) => Ok(()),
            None => Err(crate::Error::not_found(format!("user {id}"))),
        }
    }

    async fn ids_with_role(&self, role: RoleId) -> Result<Vec<UserId>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|record| record.role_ids.contains(&role))
            .map(|record| record.user.id)
            .collect())
    }
}

#[async_trait]
impl RoleRepository for MemoryRepository {
    async fn find_role(&self, id: RoleId) -> Result<Option<Role>> {
        Ok(self.tables.read().await.roles.get(&id).cloned())
    }

    async fn role_by_name(&self, name: &str) -> Result<Option<Role>> {
        Ok(self
            .tables
            .read()
            .await
            .roles
            .values()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn all_roles(&self) -> Result<Vec<Role>> {
        Ok(self.tables.read().await.roles.values().cloned().collect())
    }

    async fn save_role(&self, role: &Role) -> Result<()> {
        self.tables
            .write()
            .await
            .roles
            .insert(role.id, role.clone());
        Ok(())
    }

    async fn delete_role(&self, id: RoleId) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.roles.remove(&id).is_none() {
            return Err(crate::Error::not_found(format!("role {id}")));
        }
        for record in tables.users.values_mut() {
            record.role_ids.retain(|r| *r != id);
        }
        Ok(())
    }
}

#[async_trait]
impl PermissionRepository for MemoryRepository {
    async fn find_permission(&self, id: PermissionId) -> Result<Option<Permission>> {
        Ok(self.tables.read().await.permissions.get(&id).cloned())
    }

    async fn permission_by_name(&self, name: &str) -> Result<Option<Permission>> {
        Ok(self
            .tables
            .read()
            .await
            .permissions
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn all_permissions(&self) -> Result<Vec<Permission>> {
        Ok(self.tables.read().await.permissions.values().cloned().collect())
    }

    async fn save_permission(&self, permission: &Permission) -> Result<()> {
        self.tables
            .write()
            .await
            .permissions
            .insert(permission.id, permission.clone());
        Ok(())
    }
}
