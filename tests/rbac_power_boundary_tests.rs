//! Integration tests for power-ordered authorization: top power, the
//! self-escalation rules, best-effort membership and grant edits, and the
//! fail-closed handling of unavailable collaborators.

use std::sync::Arc;
use tokio_test::assert_ok;
use warden::prelude::*;

async fn setup() -> (Arc<MemoryRepository>, AccessEngine) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let repo = Arc::new(MemoryRepository::new());
    repo.seed_permissions(AdminPermissions::all()).await;
    let engine = AccessEngine::builder()
        .with_repository(repo.clone())
        .with_audit_logging(false)
        .build()
        .unwrap();
    (repo, engine)
}

/// A stored user whose single role carries `power` and allows `caps`.
async fn operator(repo: &Arc<MemoryRepository>, power: u32, caps: &[&str]) -> User {
    let mut role = Role::new(&format!("op-{}", RoleId::new())).with_power(power);
    for cap in caps {
        let permission = repo
            .permission_by_name(cap)
            .await
            .unwrap()
            .expect("capability must be seeded");
        role.set_grant(permission, true);
    }
    repo.save_role(&role).await.unwrap();

    let id = UserId::new();
    let user = User::new(&format!("user-{id}"), &format!("{id}@example.com")).with_role(role);
    repo.save_user(&user).await.unwrap();
    user
}

#[tokio::test]
async fn top_power_is_the_maximum_across_roles() {
    let (repo, engine) = setup().await;

    let mut user = User::new("alice", "alice@example.com");
    for power in [3u32, 7, 1] {
        user.add_role(Role::new(&format!("r{power}")).with_power(power));
    }
    repo.save_user(&user).await.unwrap();

    assert_eq!(engine.power().top_power(user.id).await.unwrap(), Some(7));

    let loner = User::new("bob", "bob@example.com");
    repo.save_user(&loner).await.unwrap();
    assert_eq!(engine.power().top_power(loner.id).await.unwrap(), None);

    engine.shutdown().await;
}

#[tokio::test]
async fn actors_cannot_escalate_to_their_own_rank() {
    let (repo, engine) = setup().await;
    let op = operator(
        &repo,
        5,
        &[
            AdminPermissions::ROLES_CREATE,
            AdminPermissions::ROLES_EDIT_POWER,
            AdminPermissions::ROLES_EDIT_NAME,
            AdminPermissions::ROLES_DELETE,
        ],
    )
    .await;

    // Creating at or above the ceiling is refused; strictly below works.
    let err = engine
        .management()
        .create_role(op.id, NewRole::named("peer").with_power(5))
        .await
        .unwrap_err();
    assert!(err.is_refusal());

    let low = engine
        .management()
        .create_role(op.id, NewRole::named("low").with_power(3))
        .await
        .unwrap();

    // Re-ranking an owned-power role up to the ceiling is refused.
    let err = engine
        .management()
        .set_role_power(op.id, low.id, 5)
        .await
        .unwrap_err();
    assert!(err.is_refusal());
    engine
        .management()
        .set_role_power(op.id, low.id, 4)
        .await
        .unwrap();

    // A role at the actor's own power cannot be touched at all.
    let peer = Role::new("peer").with_power(5);
    repo.save_role(&peer).await.unwrap();
    let err = engine
        .management()
        .rename_role(op.id, peer.id, "renamed")
        .await
        .unwrap_err();
    assert!(err.is_refusal());

    let err = engine
        .management()
        .delete_role(op.id, peer.id)
        .await
        .unwrap_err();
    assert!(err.is_refusal());

    engine.shutdown().await;
}

#[tokio::test]
async fn admins_without_roles_still_fail_power_gates() {
    let (repo, engine) = setup().await;

    let root = User::admin("root", "root@example.com");
    repo.save_user(&root).await.unwrap();

    // The capability leg passes by bypass; the power leg has nothing to
    // stand on and denies.
    let err = engine
        .management()
        .create_role(root.id, NewRole::named("anything"))
        .await
        .unwrap_err();
    assert!(err.is_refusal());

    engine.shutdown().await;
}

#[tokio::test]
async fn deleting_a_role_detaches_members_and_invalidates_them() {
    let (repo, engine) = setup().await;
    let publish = repo.seed_permissions(&["articles.publish"]).await.remove(0);
    let op = operator(&repo, 9, &[AdminPermissions::ROLES_DELETE]).await;

    let editor = Role::new("editor")
        .with_power(2)
        .with_grant(publish.clone(), true);
    repo.save_role(&editor).await.unwrap();
    let member = User::new("carol", "carol@example.com").with_role(editor.clone());
    repo.save_user(&member).await.unwrap();

    assert_eq!(engine.resolver().resolve(member.id).await.unwrap().len(), 1);

    engine
        .management()
        .delete_role(op.id, editor.id)
        .await
        .unwrap();

    let reloaded = repo.find_with_roles(member.id).await.unwrap().unwrap();
    assert!(reloaded.roles().is_empty());
    // The cached set went with the role; no stale read.
    assert!(engine.resolver().resolve(member.id).await.unwrap().is_empty());

    engine.shutdown().await;
}

#[tokio::test]
async fn membership_edits_are_best_effort_within_the_actors_authority() {
    let (repo, engine) = setup().await;
    let op = operator(&repo, 5, &[AdminPermissions::USERS_EDIT_ROLES]).await;

    let low = Role::new("low").with_power(3);
    let mid = Role::new("mid").with_power(7);
    let high = Role::new("high").with_power(9);
    for role in [&low, &mid, &high] {
        repo.save_role(role).await.unwrap();
    }

    let target = User::new("dave", "dave@example.com").with_role(high.clone());
    repo.save_user(&target).await.unwrap();

    let updated = engine
        .management()
        .set_user_roles(
            op.id,
            target.id,
            vec![
                // Below the actor's power: applied.
                RoleChange { role: low.id, member: true },
                // At or above: silently skipped, not a failure.
                RoleChange { role: mid.id, member: true },
                RoleChange { role: high.id, member: false },
            ],
        )
        .await
        .unwrap();

    assert!(updated.has_role(low.id));
    assert!(!updated.has_role(mid.id));
    assert!(updated.has_role(high.id));

    let stored = repo.find_with_roles(target.id).await.unwrap().unwrap();
    assert_eq!(stored.roles().len(), updated.roles().len());

    engine.shutdown().await;
}

#[tokio::test]
async fn grant_edits_are_scoped_to_permissions_the_actor_holds() {
    let (repo, engine) = setup().await;
    let perms = repo
        .seed_permissions(&["articles.publish", "articles.review"])
        .await;
    let publish = perms[0].clone();
    let review = perms[1].clone();

    // The operator holds publish but not review.
    let mut op_role = Role::new("op").with_power(9);
    let edit_grants = repo
        .permission_by_name(AdminPermissions::ROLES_EDIT_GRANTS)
        .await
        .unwrap()
        .unwrap();
    op_role.set_grant(edit_grants, true);
    op_role.set_grant(publish.clone(), true);
    repo.save_role(&op_role).await.unwrap();
    let op = User::new("erin", "erin@example.com").with_role(op_role);
    repo.save_user(&op).await.unwrap();

    let editor = Role::new("editor").with_power(1);
    repo.save_role(&editor).await.unwrap();

    let updated = engine
        .management()
        .set_role_grants(
            op.id,
            editor.id,
            vec![
                GrantChange { permission: publish.id, allowed: Some(true) },
                GrantChange { permission: review.id, allowed: Some(true) },
            ],
        )
        .await
        .unwrap();

    assert!(updated.grant_for(publish.id).is_some());
    assert!(updated.grant_for(review.id).is_none());

    // Tri-state: clearing takes the role back to "no vote".
    let updated = engine
        .management()
        .set_role_grants(
            op.id,
            editor.id,
            vec![GrantChange { permission: publish.id, allowed: None }],
        )
        .await
        .unwrap();
    assert!(updated.grant_for(publish.id).is_none());

    engine.shutdown().await;
}

#[tokio::test]
async fn user_deletion_rules() {
    let (repo, engine) = setup().await;
    let op = operator(&repo, 5, &[AdminPermissions::USERS_DELETE]).await;

    // Self-deletion is refused outright.
    let err = engine
        .management()
        .delete_user(op.id, op.id)
        .await
        .unwrap_err();
    assert!(err.is_refusal());

    // Admin targets are untouchable.
    let root = User::admin("root", "root@example.com");
    repo.save_user(&root).await.unwrap();
    let err = engine
        .management()
        .delete_user(op.id, root.id)
        .await
        .unwrap_err();
    assert!(err.is_refusal());

    // A peer at equal top power is out of reach.
    let peer = operator(&repo, 5, &[]).await;
    let err = engine
        .management()
        .delete_user(op.id, peer.id)
        .await
        .unwrap_err();
    assert!(err.is_refusal());

    // Strictly lower top power is deletable, and the cached set goes too.
    let minion = operator(&repo, 2, &[]).await;
    engine.resolver().resolve(minion.id).await.unwrap();
    engine
        .management()
        .delete_user(op.id, minion.id)
        .await
        .unwrap();
    assert!(repo.find_with_roles(minion.id).await.unwrap().is_none());
    assert!(engine.resolver().resolve(minion.id).await.unwrap().is_empty());

    engine.shutdown().await;
}

mod unavailable {
    use super::*;

    struct FailingUsers;

    #[async_trait::async_trait]
    impl UserRepository for FailingUsers {
        async fn find_with_roles(&self, _: UserId) -> Result<Option<User>> {
            Err(Error::unavailable("user store offline"))
        }

        async fn save_user(&self, _: &User) -> Result<()> {
            Err(Error::unavailable("user store offline"))
        }

        async fn delete_user(&self, _: UserId) -> Result<()> {
            Err(Error::unavailable("user store offline"))
        }

        async fn ids_with_role(&self, _: RoleId) -> Result<Vec<UserId>> {
            Err(Error::unavailable("user store offline"))
        }
    }

    #[tokio::test]
    async fn unavailable_stores_never_look_like_a_decision() {
        let repo = Arc::new(MemoryRepository::new());
        repo.seed_permissions(AdminPermissions::all()).await;
        let engine = AccessEngine::builder()
            .with_user_repository(Arc::new(FailingUsers))
            .with_role_repository(repo.clone())
            .with_permission_repository(repo.clone())
            .with_audit_logging(false)
            .build()
            .unwrap();

        let err = engine
            .guard()
            .has_permission(UserId::new(), &AdminPermissions::ROLES_CREATE.into())
            .await
            .unwrap_err();
        assert!(err.is_indeterminate());
        assert!(!err.is_refusal());

        // The enforcement boundary fails closed: a mutation on top of an
        // unavailable store errors instead of proceeding.
        let role = Role::new("orphan");
        repo.save_role(&role).await.unwrap();
        let result = engine
            .management()
            .set_role_power(UserId::new(), role.id, 1)
            .await;
        assert!(result.is_err());

        engine.shutdown().await;
    }
}

#[tokio::test]
async fn concurrent_checks_share_one_engine() {
    let (repo, engine) = setup().await;
    let publish = repo.seed_permissions(&["articles.publish"]).await.remove(0);

    let editor = Role::new("editor")
        .with_power(5)
        .with_grant(publish.clone(), true);
    repo.save_role(&editor).await.unwrap();
    let user = User::new("frank", "frank@example.com").with_role(editor);
    repo.save_user(&user).await.unwrap();

    let engine = Arc::new(engine);
    let mut handles = Vec::new();
    for i in 0..50 {
        let engine = engine.clone();
        let user_id = user.id;
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                engine.resolver().invalidate(user_id).await;
            }
            engine
                .guard()
                .has_permission(user_id, &"articles.publish".into())
                .await
        }));
    }

    for handle in handles {
        let decision = assert_ok!(handle.await.unwrap());
        assert!(decision);
    }

    engine.shutdown().await;
}
