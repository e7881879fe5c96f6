//! Engine assembly and lifecycle.

use crate::config::WardenConfig;
use crate::guard::AccessGuard;
use crate::management::Management;
use crate::power::PowerAuthority;
use crate::resolver::PermissionResolver;
use std::sync::Arc;
use std::time::Duration;
use warden_core::cache::{CacheStore, MemoryCache};
use warden_core::repository::{PermissionRepository, RoleRepository, UserRepository};
use warden_core::{Error, Result};

/// The assembled engine: one instance per process, constructed at startup
/// and injected where needed. There is deliberately no hidden module-level
/// instance — tests build their own and tear it down with
/// [`AccessEngine::shutdown`].
pub struct AccessEngine {
    config: WardenConfig,
    cache: Arc<dyn CacheStore>,
    resolver: Arc<PermissionResolver>,
    power: Arc<PowerAuthority>,
    guard: Arc<AccessGuard>,
    management: Management,
}

impl AccessEngine {
    /// Start building an engine.
    pub fn builder() -> AccessEngineBuilder {
        AccessEngineBuilder::new()
    }

    /// The permission resolver.
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    /// The power authority.
    pub fn power(&self) -> &PowerAuthority {
        &self.power
    }

    /// The authorization guard.
    pub fn guard(&self) -> &AccessGuard {
        &self.guard
    }

    /// The admin management surface.
    pub fn management(&self) -> &Management {
        &self.management
    }

    /// The active configuration.
    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    /// TTL the host should use for its own transient cache entries.
    pub fn transient_ttl(&self) -> Duration {
        self.config.transient_ttl()
    }

    /// The cache, for hosts that want to share it for transient values.
    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Release derived state. Call on shutdown and in test teardown.
    pub async fn shutdown(&self) {
        self.cache.clear().await;
    }
}

/// Builder for [`AccessEngine`].
pub struct AccessEngineBuilder {
    config: WardenConfig,
    cache: Option<Arc<dyn CacheStore>>,
    users: Option<Arc<dyn UserRepository>>,
    roles: Option<Arc<dyn RoleRepository>>,
    permissions: Option<Arc<dyn PermissionRepository>>,
}

impl AccessEngineBuilder {
    /// Start with the default configuration and no collaborators.
    pub fn new() -> Self {
        Self {
            config: WardenConfig::default(),
            cache: None,
            users: None,
            roles: None,
            permissions: None,
        }
    }

    /// Use this configuration.
    pub fn with_config(mut self, config: WardenConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable or disable decision audit logging.
    pub fn with_audit_logging(mut self, enabled: bool) -> Self {
        self.config.audit_enabled = enabled;
        self
    }

    /// Use this cache instead of the default in-process one.
    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use this user repository.
    pub fn with_user_repository(mut self, users: Arc<dyn UserRepository>) -> Self {
        self.users = Some(users);
        self
    }

    /// Use this role repository.
    pub fn with_role_repository(mut self, roles: Arc<dyn RoleRepository>) -> Self {
        self.roles = Some(roles);
        self
    }

    /// Use this permission repository.
    pub fn with_permission_repository(
        mut self,
        permissions: Arc<dyn PermissionRepository>,
    ) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Use one store for all three repository contracts.
    pub fn with_repository<R>(mut self, repository: Arc<R>) -> Self
    where
        R: UserRepository + RoleRepository + PermissionRepository + 'static,
    {
        self.users = Some(repository.clone());
        self.roles = Some(repository.clone());
        self.permissions = Some(repository);
        self
    }

    /// Assemble the engine.
    pub fn build(self) -> Result<AccessEngine> {
        let Self {
            config,
            cache,
            users,
            roles,
            permissions,
        } = self;

        config.validate()?;
        let users =
            users.ok_or_else(|| Error::configuration("no user repository configured"))?;
        let roles =
            roles.ok_or_else(|| Error::configuration("no role repository configured"))?;
        let permissions = permissions
            .ok_or_else(|| Error::configuration("no permission repository configured"))?;

        let cache = cache.unwrap_or_else(|| {
            Arc::new(MemoryCache::with_capacity(config.cache.max_entries))
        });

        let resolver = Arc::new(PermissionResolver::new(
            users.clone(),
            permissions.clone(),
            cache.clone(),
        ));
        let power = Arc::new(PowerAuthority::new(users.clone()));
        let guard = Arc::new(AccessGuard::new(
            resolver.clone(),
            power.clone(),
            users.clone(),
            roles.clone(),
            config.audit_enabled,
        ));
        let management = Management::new(
            guard.clone(),
            resolver.clone(),
            users,
            roles,
            permissions,
        );

        Ok(AccessEngine {
            config,
            cache,
            resolver,
            power,
            guard,
            management,
        })
    }
}

impl Default for AccessEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
