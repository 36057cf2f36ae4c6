use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::Router;

use crate::AppState;

pub mod requests;
pub mod users;

/// Build the application router. All routes are relative — the caller
/// attaches state and the outer tower layers.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/requests", post(requests::create))
        .route("/requests/filter", post(requests::list))
        .route(
            "/requests/:id",
            get(requests::get_by_id).put(requests::transition_status),
        )
        .route("/requests/update/:id", put(requests::update))
        .route("/users", post(users::create))
        .route("/users/approvers", get(users::approvers))
        .route("/users/:id", get(users::get_by_id))
        .route("/users/login", post(users::login))
        .fallback(fallback_404)
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}
