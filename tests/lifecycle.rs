//! Lifecycle engine tests: creation, status transitions, post-rejection
//! edits, and the audit invariants attached to each of them.
//!
//! All tests run the real services against the in-memory store double.

use std::sync::Arc;

use uuid::Uuid;

use approval_flow::errors::AppError;
use approval_flow::models::history::actions;
use approval_flow::models::request::{RequestPatch, RequestStatus};
use approval_flow::models::user::UserRole;
use approval_flow::services::requests::RequestService;
use approval_flow::store::memory::MemoryStore;
use approval_flow::store::{NewRequest, NewUser, Store};

async fn seed_user(store: &Arc<MemoryStore>, username: &str, role: UserRole) -> Uuid {
    store
        .insert_user(&NewUser {
            username: username.into(),
            password_hash: "irrelevant".into(),
            role,
        })
        .await
        .unwrap()
        .id
}

fn draft(title: &str, requester_id: Uuid, approver_id: Uuid) -> NewRequest {
    NewRequest {
        title: title.into(),
        description: Some("a description".into()),
        kind: "purchase".into(),
        requester_id,
        approver_id,
    }
}

async fn setup() -> (Arc<MemoryStore>, RequestService, Uuid, Uuid) {
    let store = Arc::new(MemoryStore::new());
    let service = RequestService::new(store.clone());
    let requester = seed_user(&store, "alice", UserRole::Requester).await;
    let approver = seed_user(&store, "bob", UserRole::Approver).await;
    (store, service, requester, approver)
}

#[tokio::test]
async fn create_writes_one_creado_entry_for_the_requester() {
    let (store, service, requester, approver) = setup().await;

    let request = service
        .create(draft("Buy laptop", requester, approver))
        .await
        .unwrap();

    assert_eq!(request.status, RequestStatus::Pending);

    let history = store.history_for_request(request.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].entry.action, actions::CREATED);
    assert_eq!(history[0].entry.user_id, requester);
    assert_eq!(history[0].entry.comment, None);
}

#[tokio::test]
async fn create_with_unknown_requester_fails_but_keeps_the_row() {
    let (store, service, _, approver) = setup().await;

    let err = service
        .create(draft("Orphan", Uuid::new_v4(), approver))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UserNotFound));

    // The request row is persisted before the requester lookup runs, and
    // there is no compensating delete. No audit entry is written.
    let (rows, count) = store
        .requests_with_filters(1, 10, &Default::default())
        .await
        .unwrap();
    assert_eq!(count, 1);
    // The join drops the row (requester missing), but it is in the store.
    assert!(rows.is_empty());
}

#[tokio::test]
async fn transition_on_missing_request_is_not_found_and_writes_nothing() {
    let (store, service, _, approver) = setup().await;

    let id = Uuid::new_v4();
    let err = service
        .transition_status(id, RequestStatus::Approved, approver, None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::RequestNotFound));
    assert!(store.history_for_request(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn transition_appends_exactly_one_entry_labeled_with_the_new_status() {
    let (store, service, requester, approver) = setup().await;
    let request = service
        .create(draft("Buy laptop", requester, approver))
        .await
        .unwrap();

    let updated = service
        .transition_status(
            request.id,
            RequestStatus::Approved,
            approver,
            Some("looks fine".into()),
        )
        .await
        .unwrap();

    assert_eq!(updated.status, RequestStatus::Approved);

    let history = store.history_for_request(request.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].entry.action, "Approved");
    assert_eq!(history[0].entry.comment.as_deref(), Some("looks fine"));
    assert_eq!(history[0].entry.user_id, approver);
}

#[tokio::test]
async fn transitions_are_accepted_from_any_current_status() {
    let (store, service, requester, approver) = setup().await;
    let request = service
        .create(draft("Buy laptop", requester, approver))
        .await
        .unwrap();

    // Approved is terminal for the workflow, but the engine applies any
    // requested transition regardless of the current status.
    for status in [
        RequestStatus::Approved,
        RequestStatus::Rejected,
        RequestStatus::Approved,
    ] {
        service
            .transition_status(request.id, status, approver, None)
            .await
            .unwrap();
    }

    let stored = store.request_by_id(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Approved);
    assert_eq!(store.history_for_request(request.id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn transition_with_unknown_user_leaves_the_status_write_behind() {
    let (store, service, requester, approver) = setup().await;
    let request = service
        .create(draft("Buy laptop", requester, approver))
        .await
        .unwrap();

    let err = service
        .transition_status(request.id, RequestStatus::Rejected, Uuid::new_v4(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UserNotFound));

    // The status write happens before the acting-user lookup; the two are
    // observably sequential, so the new status survives the failure while
    // the audit entry is never written.
    let stored = store.request_by_id(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Rejected);
    assert_eq!(store.history_for_request(request.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_is_refused_unless_the_request_is_rejected() {
    let (store, service, requester, approver) = setup().await;
    let request = service
        .create(draft("Buy laptop", requester, approver))
        .await
        .unwrap();

    for status in [RequestStatus::Pending, RequestStatus::Approved] {
        if status != RequestStatus::Pending {
            service
                .transition_status(request.id, status, approver, None)
                .await
                .unwrap();
        }

        let err = service
            .update(
                request.id,
                RequestPatch {
                    title: Some("new title".into()),
                    ..Default::default()
                },
                requester,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotRejected));

        let stored = store.request_by_id(request.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Buy laptop");
        assert_eq!(stored.status, status);
    }

    // Creado + the single Approved transition; the refused edits left no
    // trace in the trail.
    assert_eq!(store.history_for_request(request.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn update_on_rejected_request_resets_status_and_records_actualizado() {
    let (store, service, requester, approver) = setup().await;
    let request = service
        .create(draft("Buy laptop", requester, approver))
        .await
        .unwrap();
    service
        .transition_status(request.id, RequestStatus::Rejected, approver, None)
        .await
        .unwrap();

    let updated = service
        .update(
            request.id,
            RequestPatch {
                title: Some("Buy cheaper laptop".into()),
                ..Default::default()
            },
            requester,
        )
        .await
        .unwrap();

    assert_eq!(updated.status, RequestStatus::Pending);
    assert_eq!(updated.title, "Buy cheaper laptop");
    // Fields absent from the patch keep their prior values.
    assert_eq!(updated.description.as_deref(), Some("a description"));
    assert_eq!(updated.kind, "purchase");
    assert_eq!(updated.approver_id, approver);

    let history = store.history_for_request(request.id).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].entry.action, actions::UPDATED);
    assert_eq!(history[0].entry.user_id, requester);
}

#[tokio::test]
async fn update_with_empty_patch_still_resets_to_pending() {
    let (store, service, requester, approver) = setup().await;
    let request = service
        .create(draft("Buy laptop", requester, approver))
        .await
        .unwrap();
    service
        .transition_status(request.id, RequestStatus::Rejected, approver, None)
        .await
        .unwrap();

    let updated = service
        .update(request.id, RequestPatch::default(), requester)
        .await
        .unwrap();

    assert_eq!(updated.status, RequestStatus::Pending);
    assert_eq!(updated.title, "Buy laptop");

    let history = store.history_for_request(request.id).await.unwrap();
    assert_eq!(history[0].entry.action, actions::UPDATED);
}

#[tokio::test]
async fn update_can_reassign_the_approver() {
    let (store, service, requester, approver) = setup().await;
    let other_approver = seed_user(&store, "carol", UserRole::Approver).await;

    let request = service
        .create(draft("Buy laptop", requester, approver))
        .await
        .unwrap();
    service
        .transition_status(request.id, RequestStatus::Rejected, approver, None)
        .await
        .unwrap();

    let updated = service
        .update(
            request.id,
            RequestPatch {
                approver_id: Some(other_approver),
                ..Default::default()
            },
            requester,
        )
        .await
        .unwrap();

    assert_eq!(updated.approver_id, other_approver);
    assert_eq!(updated.status, RequestStatus::Pending);
}

#[tokio::test]
async fn update_with_unknown_approver_fails_before_any_write() {
    let (store, service, requester, approver) = setup().await;
    let request = service
        .create(draft("Buy laptop", requester, approver))
        .await
        .unwrap();
    service
        .transition_status(request.id, RequestStatus::Rejected, approver, None)
        .await
        .unwrap();

    let err = service
        .update(
            request.id,
            RequestPatch {
                title: Some("changed".into()),
                approver_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
            requester,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ApproverNotFound));

    // The approver is resolved before the row is rewritten, so nothing
    // was persisted.
    let stored = store.request_by_id(request.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Buy laptop");
    assert_eq!(stored.status, RequestStatus::Rejected);
    assert_eq!(store.history_for_request(request.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn update_resolves_the_acting_user_only_after_the_row_is_rewritten() {
    let (store, service, requester, approver) = setup().await;
    let request = service
        .create(draft("Buy laptop", requester, approver))
        .await
        .unwrap();
    service
        .transition_status(request.id, RequestStatus::Rejected, approver, None)
        .await
        .unwrap();

    let err = service
        .update(
            request.id,
            RequestPatch {
                title: Some("Buy cheaper laptop".into()),
                ..Default::default()
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UserNotFound));

    // Documented engine ordering: the acting-user existence check runs
    // after the request mutation, so the patched fields and the Pending
    // reset are already persisted when the lookup fails, and no audit
    // entry accompanies them.
    let stored = store.request_by_id(request.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Buy cheaper laptop");
    assert_eq!(stored.status, RequestStatus::Pending);
    assert_eq!(store.history_for_request(request.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn get_by_id_returns_identities_and_newest_first_history() {
    let (_store, service, requester, approver) = setup().await;
    let request = service
        .create(draft("Buy laptop", requester, approver))
        .await
        .unwrap();
    service
        .transition_status(request.id, RequestStatus::Rejected, approver, None)
        .await
        .unwrap();

    let detail = service.get_by_id(request.id).await.unwrap();
    assert_eq!(detail.view.requester.username, "alice");
    assert_eq!(detail.view.approver.username, "bob");
    assert_eq!(detail.history.len(), 2);
    assert_eq!(detail.history[0].entry.action, "Rejected");
    assert_eq!(detail.history[1].entry.action, actions::CREATED);

    let err = service.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::RequestNotFound));
}

/// End-to-end walkthrough: submit, reject with a comment, revise, resubmit.
#[tokio::test]
async fn reject_then_revise_walkthrough() {
    let (store, service, requester, approver) = setup().await;

    let request = service
        .create(draft("Buy laptop", requester, approver))
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(store.history_for_request(request.id).await.unwrap().len(), 1);

    let rejected = service
        .transition_status(
            request.id,
            RequestStatus::Rejected,
            approver,
            Some("too expensive".into()),
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);

    let history = store.history_for_request(request.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].entry.action, "Rejected");
    assert_eq!(history[0].entry.user_id, approver);
    assert_eq!(history[0].entry.comment.as_deref(), Some("too expensive"));

    let revised = service
        .update(
            request.id,
            RequestPatch {
                title: Some("Buy cheaper laptop".into()),
                ..Default::default()
            },
            requester,
        )
        .await
        .unwrap();
    assert_eq!(revised.status, RequestStatus::Pending);
    assert_eq!(revised.title, "Buy cheaper laptop");

    let history = store.history_for_request(request.id).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].entry.action, actions::UPDATED);
    assert_eq!(history[0].entry.user_id, requester);
}
