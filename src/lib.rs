//! Approval Flow — request lifecycle service with an append-only audit
//! trail. Requesters submit requests, approvers decide them, rejected
//! requests can be revised and resubmitted, and every step is recorded.

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod store;

use services::requests::RequestService;
use services::users::UserService;

/// Shared application state passed to handlers.
pub struct AppState {
    pub requests: RequestService,
    pub users: UserService,
    pub config: config::Config,
}
