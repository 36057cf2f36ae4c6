use async_trait::async_trait;
use uuid::Uuid;

use crate::models::history::{HistoryEntry, HistoryView};
use crate::models::request::{Request, RequestFilters, RequestView};
use crate::models::user::{User, UserRole, UserSummary};

#[cfg(feature = "test-utils")]
pub mod memory;
pub mod postgres;

/// Insert payload for a user account. The hash is produced by the user
/// service before it reaches the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Insert payload for a request. Status always starts at Pending.
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub title: String,
    pub description: Option<String>,
    pub kind: String,
    pub requester_id: Uuid,
    pub approver_id: Uuid,
}

/// Insert payload for one audit entry.
#[derive(Debug, Clone)]
pub struct NewHistory {
    pub action: String,
    pub comment: Option<String>,
    pub user_id: Uuid,
    pub request_id: Uuid,
}

/// Relational store consumed by the services. Injected explicitly so tests
/// can swap in [`memory::MemoryStore`] without touching global state.
///
/// History has no update or delete surface: entries are append-only.
#[async_trait]
pub trait Store: Send + Sync {
    // -- User Operations --

    async fn insert_user(&self, user: &NewUser) -> anyhow::Result<User>;
    async fn user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn user_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn users_by_role(&self, role: UserRole) -> anyhow::Result<Vec<UserSummary>>;

    // -- Request Operations --

    async fn insert_request(&self, request: &NewRequest) -> anyhow::Result<Request>;
    async fn request_by_id(&self, id: Uuid) -> anyhow::Result<Option<Request>>;
    async fn update_request(&self, request: &Request) -> anyhow::Result<()>;

    /// Filtered, paginated listing joined with requester/approver
    /// identities, newest first. Returns the page slice and the total
    /// match count before pagination.
    async fn requests_with_filters(
        &self,
        page: u64,
        limit: u64,
        filters: &RequestFilters,
    ) -> anyhow::Result<(Vec<RequestView>, u64)>;

    // -- History Operations --

    async fn insert_history(&self, entry: &NewHistory) -> anyhow::Result<HistoryEntry>;

    /// Audit trail for one request, newest entry first.
    async fn history_for_request(&self, request_id: Uuid) -> anyhow::Result<Vec<HistoryView>>;
}
