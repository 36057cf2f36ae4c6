use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::history::{HistoryEntry, HistoryView};
use crate::models::request::{Request, RequestFilters, RequestStatus, RequestView};
use crate::models::user::{User, UserRole, UserSummary};
use crate::store::{NewHistory, NewRequest, NewUser, Store};

/// In-memory store double for the test suite. Mirrors the Postgres
/// implementation's query semantics (ordering, filter matching, unique
/// usernames) but does not enforce foreign keys, so tests can drive the
/// engine's write-ordering paths directly.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    requests: Vec<Request>,
    history: Vec<HistoryEntry>,
    next_history_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow::anyhow!("store mutex poisoned"))
    }
}

fn matches(request: &Request, filters: &RequestFilters) -> bool {
    if let Some(search) = &filters.search {
        let needle = search.to_lowercase();
        let in_title = request.title.to_lowercase().contains(&needle);
        let in_description = request
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(&needle));
        if !in_title && !in_description {
            return false;
        }
    }
    if let Some(status) = filters.status {
        if request.status != status {
            return false;
        }
    }
    if let Some(kind) = &filters.kind {
        if &request.kind != kind {
            return false;
        }
    }
    if let Some(requester_id) = filters.requester_id {
        if request.requester_id != requester_id {
            return false;
        }
    }
    if let Some(approver_id) = filters.approver_id {
        if request.approver_id != approver_id {
            return false;
        }
    }
    true
}

#[async_trait]
impl Store for MemoryStore {
    // -- User Operations --

    async fn insert_user(&self, user: &NewUser) -> anyhow::Result<User> {
        let mut inner = self.lock()?;
        if inner.users.iter().any(|u| u.username == user.username) {
            anyhow::bail!("duplicate username: {}", user.username);
        }
        let row = User {
            id: Uuid::new_v4(),
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role,
            created_at: Utc::now(),
        };
        inner.users.push(row.clone());
        Ok(row)
    }

    async fn user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let inner = self.lock()?;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let inner = self.lock()?;
        Ok(inner.users.iter().find(|u| u.username == username).cloned())
    }

    async fn users_by_role(&self, role: UserRole) -> anyhow::Result<Vec<UserSummary>> {
        let inner = self.lock()?;
        Ok(inner
            .users
            .iter()
            .filter(|u| u.role == role)
            .map(User::summary)
            .collect())
    }

    // -- Request Operations --

    async fn insert_request(&self, request: &NewRequest) -> anyhow::Result<Request> {
        let mut inner = self.lock()?;
        let row = Request {
            id: Uuid::new_v4(),
            title: request.title.clone(),
            description: request.description.clone(),
            kind: request.kind.clone(),
            status: RequestStatus::Pending,
            requester_id: request.requester_id,
            approver_id: request.approver_id,
            created_at: Utc::now(),
        };
        inner.requests.push(row.clone());
        Ok(row)
    }

    async fn request_by_id(&self, id: Uuid) -> anyhow::Result<Option<Request>> {
        let inner = self.lock()?;
        Ok(inner.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn update_request(&self, request: &Request) -> anyhow::Result<()> {
        let mut inner = self.lock()?;
        if let Some(row) = inner.requests.iter_mut().find(|r| r.id == request.id) {
            row.title = request.title.clone();
            row.description = request.description.clone();
            row.kind = request.kind.clone();
            row.status = request.status;
            row.approver_id = request.approver_id;
        }
        Ok(())
    }

    async fn requests_with_filters(
        &self,
        page: u64,
        limit: u64,
        filters: &RequestFilters,
    ) -> anyhow::Result<(Vec<RequestView>, u64)> {
        let inner = self.lock()?;
        // Insertion order tracks created_at, so newest-first is a reverse
        // scan, matching the Postgres ORDER BY.
        let matched: Vec<&Request> = inner
            .requests
            .iter()
            .rev()
            .filter(|r| matches(r, filters))
            .collect();
        let count = matched.len() as u64;
        let data = matched
            .into_iter()
            .skip((page.saturating_sub(1) * limit) as usize)
            .take(limit as usize)
            .filter_map(|r| {
                let requester = inner.users.iter().find(|u| u.id == r.requester_id)?;
                let approver = inner.users.iter().find(|u| u.id == r.approver_id)?;
                Some(RequestView {
                    request: r.clone(),
                    requester: requester.summary(),
                    approver: approver.summary(),
                })
            })
            .collect();
        Ok((data, count))
    }

    // -- History Operations --

    async fn insert_history(&self, entry: &NewHistory) -> anyhow::Result<HistoryEntry> {
        let mut inner = self.lock()?;
        inner.next_history_id += 1;
        let row = HistoryEntry {
            id: inner.next_history_id,
            action: entry.action.clone(),
            comment: entry.comment.clone(),
            user_id: entry.user_id,
            request_id: entry.request_id,
            created_at: Utc::now(),
        };
        inner.history.push(row.clone());
        Ok(row)
    }

    async fn history_for_request(&self, request_id: Uuid) -> anyhow::Result<Vec<HistoryView>> {
        let inner = self.lock()?;
        let mut rows: Vec<&HistoryEntry> = inner
            .history
            .iter()
            .filter(|h| h.request_id == request_id)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows
            .into_iter()
            .filter_map(|h| {
                let user = inner.users.iter().find(|u| u.id == h.user_id)?;
                Some(HistoryView {
                    entry: h.clone(),
                    user: user.summary(),
                })
            })
            .collect())
    }
}
