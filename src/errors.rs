use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Request not found")]
    RequestNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("approver not found")]
    ApproverNotFound,

    #[error("only rejected requests may be modified")]
    NotRejected,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::RequestNotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "request_not_found",
                self.to_string(),
            ),
            AppError::UserNotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "user_not_found",
                self.to_string(),
            ),
            AppError::ApproverNotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "approver_not_found",
                self.to_string(),
            ),
            AppError::NotRejected => (
                StatusCode::CONFLICT,
                "invalid_request_error",
                "request_not_rejected",
                self.to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "invalid_credentials",
                self.to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
