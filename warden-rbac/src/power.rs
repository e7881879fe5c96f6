//! Power-ordered authorization rules.
//!
//! Roles carry an integer power ranking; every privileged mutation that
//! targets a role or another user is gated on strict ordering against the
//! actor's top power. The predicates here are the single source of those
//! rules — endpoints compose them instead of re-deriving comparisons.

use std::sync::Arc;
use warden_core::repository::UserRepository;
use warden_core::types::{Role, UserId};
use warden_core::{Error, Result};

/// Computes top power and the comparison predicates built on it.
pub struct PowerAuthority {
    users: Arc<dyn UserRepository>,
}

impl PowerAuthority {
    /// Wire the authority to user storage.
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Maximum power among the user's roles.
    ///
    /// `Ok(None)` for a user with no roles — deliberately not 0, which
    /// could under- or over-authorize depending on the powers in play.
    /// Every predicate below treats `None` on the actor side as "may not
    /// act".
    pub async fn top_power(&self, user_id: UserId) -> Result<Option<u32>> {
        let user = self
            .users
            .find_with_roles(user_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("user {user_id}")))?;
        Ok(user.top_power())
    }

    /// May the actor modify or delete this role? Requires strictly higher
    /// top power than the role carries.
    pub async fn may_modify_role(&self, actor: UserId, role: &Role) -> Result<bool> {
        Ok(match self.top_power(actor).await? {
            Some(top) => top > role.power,
            None => false,
        })
    }

    /// May the actor assign this power value to a role? The value must stay
    /// strictly under the actor's own ceiling, so nobody can mint a role at
    /// or above their own rank.
    pub async fn may_assign_power(&self, actor: UserId, power: u32) -> Result<bool> {
        Ok(match self.top_power(actor).await? {
            Some(top) => power < top,
            None => false,
        })
    }

    /// May the actor act on (e.g. delete) this user? The target's top power
    /// must be strictly lower. A target with no roles is out-ranked by any
    /// actor that has one.
    pub async fn may_act_on_user(&self, actor: UserId, target: UserId) -> Result<bool> {
        let Some(actor_top) = self.top_power(actor).await? else {
            return Ok(false);
        };
        Ok(match self.top_power(target).await? {
            Some(target_top) => target_top < actor_top,
            None => true,
        })
    }
}
