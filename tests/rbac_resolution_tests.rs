//! Integration tests for effective-permission resolution: admin bypass,
//! MFA gating, power-ordered tri-state grants, and the cache contract.

use std::sync::Arc;
use warden::prelude::*;

async fn engine_over(repo: Arc<MemoryRepository>) -> AccessEngine {
    AccessEngine::builder()
        .with_repository(repo)
        .with_audit_logging(false)
        .build()
        .unwrap()
}

fn names(permissions: &[Permission]) -> Vec<String> {
    let mut names: Vec<String> = permissions.iter().map(|p| p.name.clone()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn admin_resolves_to_the_full_current_catalog() {
    let repo = Arc::new(MemoryRepository::new());
    let seeded = repo
        .seed_permissions(&["articles.publish", "articles.review", "articles.delete"])
        .await;
    let engine = engine_over(repo.clone()).await;

    // No roles at all; the bypass does not depend on them.
    let root = User::admin("root", "root@example.com");
    repo.save_user(&root).await.unwrap();

    let resolved = engine.resolver().resolve(root.id).await.unwrap();
    assert_eq!(names(&resolved), names(&seeded));

    // The bypass tracks the live catalog, not a snapshot.
    repo.seed_permissions(&["articles.feature"]).await;
    engine.resolver().invalidate(root.id).await;
    let resolved = engine.resolver().resolve(root.id).await.unwrap();
    assert_eq!(resolved.len(), 4);

    engine.shutdown().await;
}

#[tokio::test]
async fn mfa_gates_a_denying_reviewer_role() {
    let repo = Arc::new(MemoryRepository::new());
    let publish = repo.seed_permissions(&["articles.publish"]).await.remove(0);
    let engine = engine_over(repo.clone()).await;

    let editor = Role::new("editor")
        .with_power(5)
        .with_grant(publish.clone(), true);
    let reviewer = Role::new("reviewer")
        .with_power(8)
        .requiring_mfa()
        .with_grant(publish.clone(), false);
    repo.save_role(&editor).await.unwrap();
    repo.save_role(&reviewer).await.unwrap();

    let user = User::new("carol", "carol@example.com")
        .with_role(editor)
        .with_role(reviewer);
    repo.save_user(&user).await.unwrap();

    // MFA disabled: the reviewer role is inert, the editor's allow carries.
    let resolved = engine.resolver().resolve(user.id).await.unwrap();
    assert_eq!(names(&resolved), vec!["articles.publish".to_string()]);

    // Enrolling flips the outcome: the reviewer out-ranks the editor and
    // denies.
    let mut enrolled = repo.find_with_roles(user.id).await.unwrap().unwrap();
    enrolled.mfa_enabled = true;
    repo.save_user(&enrolled).await.unwrap();
    engine.resolver().invalidate(user.id).await;

    let resolved = engine.resolver().resolve(user.id).await.unwrap();
    assert!(resolved.is_empty());

    engine.shutdown().await;
}

#[tokio::test]
async fn higher_power_allow_beats_lower_power_deny() {
    let repo = Arc::new(MemoryRepository::new());
    let publish = repo.seed_permissions(&["articles.publish"]).await.remove(0);
    let engine = engine_over(repo.clone()).await;

    let senior = Role::new("senior")
        .with_power(10)
        .with_grant(publish.clone(), true);
    let junior = Role::new("junior")
        .with_power(5)
        .with_grant(publish.clone(), false);
    repo.save_role(&senior).await.unwrap();
    repo.save_role(&junior).await.unwrap();

    let user = User::new("dave", "dave@example.com")
        .with_role(junior)
        .with_role(senior);
    repo.save_user(&user).await.unwrap();

    let resolved = engine.resolver().resolve(user.id).await.unwrap();
    assert_eq!(names(&resolved), vec!["articles.publish".to_string()]);

    engine.shutdown().await;
}

#[tokio::test]
async fn unvoted_permissions_are_never_granted() {
    let repo = Arc::new(MemoryRepository::new());
    let perms = repo
        .seed_permissions(&["articles.publish", "articles.review"])
        .await;
    let engine = engine_over(repo.clone()).await;

    let editor = Role::new("editor")
        .with_power(5)
        .with_grant(perms[0].clone(), true);
    repo.save_role(&editor).await.unwrap();

    let user = User::new("erin", "erin@example.com").with_role(editor);
    repo.save_user(&user).await.unwrap();

    let resolved = engine.resolver().resolve(user.id).await.unwrap();
    assert_eq!(names(&resolved), vec!["articles.publish".to_string()]);

    // A name nobody seeded is never granted to a regular user, while the
    // admin bypass does not depend on the catalog at all.
    assert!(
        !engine
            .guard()
            .has_permission(user.id, &"articles.unseeded".into())
            .await
            .unwrap()
    );

    let root = User::admin("root", "root@example.com");
    repo.save_user(&root).await.unwrap();
    assert!(
        engine
            .guard()
            .has_permission(root.id, &"articles.unseeded".into())
            .await
            .unwrap()
    );

    engine.shutdown().await;
}

#[tokio::test]
async fn resolution_is_idempotent() {
    let repo = Arc::new(MemoryRepository::new());
    let perms = repo
        .seed_permissions(&["articles.publish", "articles.review"])
        .await;
    let engine = engine_over(repo.clone()).await;

    let editor = Role::new("editor")
        .with_power(5)
        .with_grant(perms[0].clone(), true)
        .with_grant(perms[1].clone(), true);
    repo.save_role(&editor).await.unwrap();

    let user = User::new("frank", "frank@example.com").with_role(editor);
    repo.save_user(&user).await.unwrap();

    let first = engine.resolver().resolve(user.id).await.unwrap();
    let second = engine.resolver().resolve(user.id).await.unwrap();
    assert_eq!(names(&first), names(&second));

    engine.shutdown().await;
}

#[tokio::test]
async fn zero_surviving_roles_resolve_to_the_empty_set() {
    let repo = Arc::new(MemoryRepository::new());
    repo.seed_permissions(&["articles.publish"]).await;
    let engine = engine_over(repo.clone()).await;

    let user = User::new("grace", "grace@example.com");
    repo.save_user(&user).await.unwrap();
    assert!(engine.resolver().resolve(user.id).await.unwrap().is_empty());

    // An id nobody stored behaves the same.
    assert!(
        engine
            .resolver()
            .resolve(UserId::new())
            .await
            .unwrap()
            .is_empty()
    );

    engine.shutdown().await;
}

#[tokio::test]
async fn mutation_plus_invalidation_is_visible_immediately() {
    let repo = Arc::new(MemoryRepository::new());
    let publish = repo.seed_permissions(&["articles.publish"]).await.remove(0);
    let engine = engine_over(repo.clone()).await;

    let mut editor = Role::new("editor")
        .with_power(5)
        .with_grant(publish.clone(), true);
    repo.save_role(&editor).await.unwrap();

    let user = User::new("heidi", "heidi@example.com").with_role(editor.clone());
    repo.save_user(&user).await.unwrap();

    let resolved = engine.resolver().resolve(user.id).await.unwrap();
    assert_eq!(resolved.len(), 1);

    editor.set_grant(publish.clone(), false);
    repo.save_role(&editor).await.unwrap();
    engine.resolver().invalidate(user.id).await;

    assert!(engine.resolver().resolve(user.id).await.unwrap().is_empty());

    engine.shutdown().await;
}

#[tokio::test]
async fn shutdown_drops_all_derived_state() {
    let repo = Arc::new(MemoryRepository::new());
    let publish = repo.seed_permissions(&["articles.publish"]).await.remove(0);
    let engine = engine_over(repo.clone()).await;

    let mut editor = Role::new("editor")
        .with_power(5)
        .with_grant(publish.clone(), true);
    repo.save_role(&editor).await.unwrap();
    let user = User::new("ivan", "ivan@example.com").with_role(editor.clone());
    repo.save_user(&user).await.unwrap();

    assert_eq!(engine.resolver().resolve(user.id).await.unwrap().len(), 1);

    // Mutating without invalidating leaves the cached set visible: the
    // cache really is serving reads.
    editor.clear_grant(publish.id);
    repo.save_role(&editor).await.unwrap();
    assert_eq!(engine.resolver().resolve(user.id).await.unwrap().len(), 1);

    // Teardown wipes derived state; the next read recomputes.
    engine.shutdown().await;
    assert!(engine.resolver().resolve(user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_cache_entries_count_as_misses() {
    let repo = Arc::new(MemoryRepository::new());
    let publish = repo.seed_permissions(&["articles.publish"]).await.remove(0);
    let engine = engine_over(repo.clone()).await;

    let editor = Role::new("editor")
        .with_power(5)
        .with_grant(publish.clone(), true);
    repo.save_role(&editor).await.unwrap();
    let user = User::new("judy", "judy@example.com").with_role(editor);
    repo.save_user(&user).await.unwrap();

    engine
        .cache()
        .set(
            &format!("user-permissions-{}", user.id),
            serde_json::json!("not a permission list"),
            None,
        )
        .await;

    let resolved = engine.resolver().resolve(user.id).await.unwrap();
    assert_eq!(names(&resolved), vec!["articles.publish".to_string()]);

    engine.shutdown().await;
}
