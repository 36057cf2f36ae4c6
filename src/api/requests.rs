use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::request::{
    Page, Request, RequestDetail, RequestFilters, RequestPatch, RequestStatus, RequestView,
};
use crate::models::user::{Caller, UserRole};
use crate::store::NewRequest;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub requester_id: Uuid,
    pub approver_id: Uuid,
}

/// POST /requests — submit a new approval request
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<Request>), AppError> {
    let request = state
        .requests
        .create(NewRequest {
            title: body.title,
            description: body.description,
            kind: body.kind,
            requester_id: body.requester_id,
            approver_id: body.approver_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Debug, Deserialize)]
pub struct ListRequestsBody {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub status: Option<RequestStatus>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub requester_id: Option<Uuid>,
    pub approver_id: Option<Uuid>,
    pub user_id: Uuid,
    pub role: UserRole,
}

/// POST /requests/filter — role-scoped filtered, paginated listing
pub async fn list(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ListRequestsBody>,
) -> Result<Json<Page<RequestView>>, AppError> {
    let caller = Caller {
        id: body.user_id,
        role: body.role,
    };
    let filters = RequestFilters {
        search: body.search,
        status: body.status,
        kind: body.kind,
        requester_id: body.requester_id,
        approver_id: body.approver_id,
    };

    let page = state
        .requests
        .list(body.page, body.limit, filters, caller)
        .await?;

    Ok(Json(page))
}

/// GET /requests/:id — request with identities and audit trail
pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<RequestDetail>, AppError> {
    let detail = state.requests.get_by_id(id).await?;
    Ok(Json(detail))
}

#[derive(Debug, Deserialize)]
pub struct TransitionBody {
    pub status: RequestStatus,
    pub user_id: Uuid,
    pub comment: Option<String>,
}

/// PUT /requests/:id — overwrite the request's status
pub async fn transition_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<TransitionBody>,
) -> Result<Json<Request>, AppError> {
    let request = state
        .requests
        .transition_status(id, body.status, body.user_id, body.comment)
        .await?;

    Ok(Json(request))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
    #[serde(flatten)]
    pub patch: RequestPatch,
    pub user_id: Uuid,
}

/// PUT /requests/update/:id — revise a rejected request
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateBody>,
) -> Result<Json<Request>, AppError> {
    let request = state.requests.update(id, body.patch, body.user_id).await?;
    Ok(Json(request))
}
