//! User directory tests: Argon2id credential handling and role lookups.

use std::sync::Arc;

use uuid::Uuid;

use approval_flow::errors::AppError;
use approval_flow::models::user::UserRole;
use approval_flow::services::users::UserService;
use approval_flow::store::memory::MemoryStore;
use approval_flow::store::Store;

fn setup() -> (Arc<MemoryStore>, UserService) {
    let store = Arc::new(MemoryStore::new());
    let service = UserService::new(store.clone());
    (store, service)
}

#[tokio::test]
async fn passwords_are_stored_as_salted_argon2_hashes() {
    let (store, service) = setup();

    service
        .create("alice", "hunter2", UserRole::Requester)
        .await
        .unwrap();

    let stored = store.user_by_username("alice").await.unwrap().unwrap();
    assert_ne!(stored.password_hash, "hunter2");
    assert!(stored.password_hash.starts_with("$argon2"));

    // Same password, different salt, different hash.
    service
        .create("carol", "hunter2", UserRole::Requester)
        .await
        .unwrap();
    let other = store.user_by_username("carol").await.unwrap().unwrap();
    assert_ne!(stored.password_hash, other.password_hash);
}

#[tokio::test]
async fn authenticate_verifies_against_the_stored_hash() {
    let (_store, service) = setup();
    let created = service
        .create("alice", "hunter2", UserRole::Approver)
        .await
        .unwrap();

    let identity = service
        .authenticate("alice", "hunter2")
        .await
        .unwrap()
        .expect("correct credentials should authenticate");
    assert_eq!(identity.id, created.id);
    assert_eq!(identity.role, UserRole::Approver);

    assert!(service
        .authenticate("alice", "wrong password")
        .await
        .unwrap()
        .is_none());
    assert!(service
        .authenticate("nobody", "hunter2")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn approvers_returns_only_approver_projections() {
    let (_store, service) = setup();
    service
        .create("alice", "pw", UserRole::Requester)
        .await
        .unwrap();
    let bob = service.create("bob", "pw", UserRole::Approver).await.unwrap();
    let dave = service
        .create("dave", "pw", UserRole::Approver)
        .await
        .unwrap();

    let approvers = service.approvers().await.unwrap();
    let mut usernames: Vec<&str> = approvers.iter().map(|a| a.username.as_str()).collect();
    usernames.sort_unstable();
    assert_eq!(usernames, ["bob", "dave"]);
    assert!(approvers
        .iter()
        .all(|a| a.id == bob.id || a.id == dave.id));
}

#[tokio::test]
async fn find_by_id_reports_missing_users() {
    let (_store, service) = setup();
    let err = service.find_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::UserNotFound));
}

#[tokio::test]
async fn duplicate_usernames_are_rejected() {
    let (_store, service) = setup();
    service
        .create("alice", "pw", UserRole::Requester)
        .await
        .unwrap();

    let err = service.create("alice", "pw", UserRole::Requester).await;
    assert!(err.is_err());
}
