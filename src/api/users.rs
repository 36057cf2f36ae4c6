use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{User, UserRole, UserSummary};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
    pub username: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::Requester
}

/// POST /users — register an account
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserBody>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state
        .users
        .create(&body.username, &body.password, body.role)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

/// POST /users/login — check credentials, return the account identity
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginBody>,
) -> Result<Json<UserSummary>, AppError> {
    match state
        .users
        .authenticate(&body.username, &body.password)
        .await?
    {
        Some(identity) => Ok(Json(identity)),
        None => Err(AppError::InvalidCredentials),
    }
}

/// GET /users/approvers — accounts that can decide requests
pub async fn approvers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    let approvers = state.users.approvers().await?;
    Ok(Json(approvers))
}

/// GET /users/:id
pub async fn get_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = state.users.find_by_id(id).await?;
    Ok(Json(user))
}
