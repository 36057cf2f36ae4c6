use std::sync::Arc;

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::history::actions;
use crate::models::request::{
    Page, Request, RequestDetail, RequestFilters, RequestPatch, RequestStatus, RequestView,
};
use crate::models::user::{Caller, UserRole};
use crate::store::{NewHistory, NewRequest, Store};

/// Owns the request lifecycle: creation, status transitions, and
/// post-rejection edits. Every mutation appends exactly one history entry,
/// and nothing else in the crate writes history.
///
/// Each operation is a short sequence of dependent store calls awaited in
/// order. There is no multi-row transaction: concurrent writers on the
/// same request race last-write-wins, and each surviving write keeps its
/// own history entry.
#[derive(Clone)]
pub struct RequestService {
    store: Arc<dyn Store>,
}

impl RequestService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create a request in Pending status and record the "Creado" entry
    /// attributed to the requester.
    ///
    /// The requester is resolved only after the request row is persisted;
    /// if the lookup fails the row stays behind and the operation errors
    /// with no compensating delete.
    pub async fn create(&self, draft: NewRequest) -> Result<Request, AppError> {
        let request = self.store.insert_request(&draft).await?;

        let requester = self
            .store
            .user_by_id(draft.requester_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        self.store
            .insert_history(&NewHistory {
                action: actions::CREATED.to_string(),
                comment: None,
                user_id: requester.id,
                request_id: request.id,
            })
            .await?;

        tracing::info!(request_id = %request.id, requester = %requester.username, "request created");
        Ok(request)
    }

    /// Overwrite the request's status and append the matching history
    /// entry. Any target status is accepted from any current status; the
    /// only gate on the state machine lives in [`Self::update`].
    ///
    /// The status write completes before the acting user is resolved, so a
    /// failed lookup leaves the new status persisted with no history row.
    pub async fn transition_status(
        &self,
        id: Uuid,
        status: RequestStatus,
        acting_user_id: Uuid,
        comment: Option<String>,
    ) -> Result<Request, AppError> {
        let mut request = self
            .store
            .request_by_id(id)
            .await?
            .ok_or(AppError::RequestNotFound)?;

        request.status = status;
        self.store.update_request(&request).await?;

        let user = self
            .store
            .user_by_id(acting_user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        self.store
            .insert_history(&NewHistory {
                action: status.as_str().to_string(),
                comment,
                user_id: user.id,
                request_id: request.id,
            })
            .await?;

        tracing::info!(request_id = %request.id, status = status.as_str(), acting_user = %user.username, "status transition");
        Ok(request)
    }

    /// Revise a rejected request. Provided fields overwrite, absent fields
    /// keep their prior value, and the status is forced back to Pending.
    ///
    /// The acting user is resolved only after the row has been rewritten;
    /// when that lookup fails the patched fields and Pending status stay
    /// persisted with no history row.
    pub async fn update(
        &self,
        id: Uuid,
        patch: RequestPatch,
        acting_user_id: Uuid,
    ) -> Result<Request, AppError> {
        let mut request = self
            .store
            .request_by_id(id)
            .await?
            .ok_or(AppError::RequestNotFound)?;

        if request.status != RequestStatus::Rejected {
            return Err(AppError::NotRejected);
        }

        request.title = patch.title.unwrap_or(request.title);
        request.description = patch.description.or(request.description);
        request.kind = patch.kind.unwrap_or(request.kind);

        if let Some(approver_id) = patch.approver_id {
            let approver = self
                .store
                .user_by_id(approver_id)
                .await?
                .ok_or(AppError::ApproverNotFound)?;
            request.approver_id = approver.id;
        }

        request.status = RequestStatus::Pending;
        self.store.update_request(&request).await?;

        let user = self
            .store
            .user_by_id(acting_user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        self.store
            .insert_history(&NewHistory {
                action: actions::UPDATED.to_string(),
                comment: None,
                user_id: user.id,
                request_id: request.id,
            })
            .await?;

        tracing::info!(request_id = %request.id, acting_user = %user.username, "request revised");
        Ok(request)
    }

    /// Single request with requester/approver identities and its audit
    /// trail, newest entry first.
    pub async fn get_by_id(&self, id: Uuid) -> Result<RequestDetail, AppError> {
        let request = self
            .store
            .request_by_id(id)
            .await?
            .ok_or(AppError::RequestNotFound)?;

        let requester = self
            .store
            .user_by_id(request.requester_id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        let approver = self
            .store
            .user_by_id(request.approver_id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        let history = self.store.history_for_request(id).await?;

        Ok(RequestDetail {
            view: RequestView {
                requester: requester.summary(),
                approver: approver.summary(),
                request,
            },
            history,
        })
    }

    /// Role-scoped, filtered, paginated listing. The caller's role decides
    /// the forced scope: requesters only ever see their own submissions,
    /// approvers only requests assigned to them. A caller-supplied
    /// requester/approver filter is overridden, never widened.
    pub async fn list(
        &self,
        page: Option<u64>,
        limit: Option<u64>,
        mut filters: RequestFilters,
        caller: Caller,
    ) -> Result<Page<RequestView>, AppError> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(5).clamp(1, 100);

        match caller.role {
            UserRole::Requester => filters.requester_id = Some(caller.id),
            UserRole::Approver => filters.approver_id = Some(caller.id),
        }

        let (data, count) = self
            .store
            .requests_with_filters(page, limit, &filters)
            .await?;

        Ok(Page {
            data,
            count,
            page,
            limit,
            total_pages: count.div_ceil(limit),
        })
    }
}
