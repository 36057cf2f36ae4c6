use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::history::{HistoryEntry, HistoryView};
use crate::models::request::{Request, RequestFilters, RequestStatus, RequestView};
use crate::models::user::{User, UserRole, UserSummary};
use crate::store::{NewHistory, NewRequest, NewUser, Store};

/// PostgreSQL-backed store. One pool per process, created at startup and
/// handed to the services.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Flat row shape produced by the listing join.
#[derive(sqlx::FromRow)]
struct RequestViewRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    kind: String,
    status: RequestStatus,
    requester_id: Uuid,
    approver_id: Uuid,
    created_at: DateTime<Utc>,
    requester_username: String,
    requester_role: UserRole,
    approver_username: String,
    approver_role: UserRole,
}

impl From<RequestViewRow> for RequestView {
    fn from(row: RequestViewRow) -> Self {
        RequestView {
            requester: UserSummary {
                id: row.requester_id,
                username: row.requester_username,
                role: row.requester_role,
            },
            approver: UserSummary {
                id: row.approver_id,
                username: row.approver_username,
                role: row.approver_role,
            },
            request: Request {
                id: row.id,
                title: row.title,
                description: row.description,
                kind: row.kind,
                status: row.status,
                requester_id: row.requester_id,
                approver_id: row.approver_id,
                created_at: row.created_at,
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct HistoryViewRow {
    id: i64,
    action: String,
    comment: Option<String>,
    user_id: Uuid,
    request_id: Uuid,
    created_at: DateTime<Utc>,
    username: String,
    role: UserRole,
}

impl From<HistoryViewRow> for HistoryView {
    fn from(row: HistoryViewRow) -> Self {
        HistoryView {
            user: UserSummary {
                id: row.user_id,
                username: row.username,
                role: row.role,
            },
            entry: HistoryEntry {
                id: row.id,
                action: row.action,
                comment: row.comment,
                user_id: row.user_id,
                request_id: row.request_id,
                created_at: row.created_at,
            },
        }
    }
}

/// Append the optional filter predicates. Matches the listing contract:
/// case-insensitive substring on title OR description, exact equality on
/// everything else, all predicates ANDed.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &RequestFilters) {
    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", search.to_lowercase());
        qb.push(" AND (LOWER(r.title) LIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR LOWER(r.description) LIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
    if let Some(status) = filters.status {
        qb.push(" AND r.status = ");
        qb.push_bind(status);
    }
    if let Some(kind) = &filters.kind {
        qb.push(" AND r.kind = ");
        qb.push_bind(kind.clone());
    }
    if let Some(requester_id) = filters.requester_id {
        qb.push(" AND r.requester_id = ");
        qb.push_bind(requester_id);
    }
    if let Some(approver_id) = filters.approver_id {
        qb.push(" AND r.approver_id = ");
        qb.push_bind(approver_id);
    }
}

#[async_trait]
impl Store for PgStore {
    // -- User Operations --

    async fn insert_user(&self, user: &NewUser) -> anyhow::Result<User> {
        let row = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, password_hash, role)
               VALUES ($1, $2, $3)
               RETURNING id, username, password_hash, role, created_at"#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn users_by_role(&self, role: UserRole) -> anyhow::Result<Vec<UserSummary>> {
        let rows = sqlx::query_as::<_, UserSummary>(
            "SELECT id, username, role FROM users WHERE role = $1 ORDER BY created_at ASC",
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // -- Request Operations --

    async fn insert_request(&self, request: &NewRequest) -> anyhow::Result<Request> {
        let row = sqlx::query_as::<_, Request>(
            r#"INSERT INTO requests (title, description, kind, requester_id, approver_id)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, title, description, kind, status, requester_id, approver_id, created_at"#,
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.kind)
        .bind(request.requester_id)
        .bind(request.approver_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn request_by_id(&self, id: Uuid) -> anyhow::Result<Option<Request>> {
        let row = sqlx::query_as::<_, Request>(
            r#"SELECT id, title, description, kind, status, requester_id, approver_id, created_at
               FROM requests WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_request(&self, request: &Request) -> anyhow::Result<()> {
        sqlx::query(
            r#"UPDATE requests
               SET title = $1, description = $2, kind = $3, status = $4, approver_id = $5
               WHERE id = $6"#,
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.kind)
        .bind(request.status)
        .bind(request.approver_id)
        .bind(request.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn requests_with_filters(
        &self,
        page: u64,
        limit: u64,
        filters: &RequestFilters,
    ) -> anyhow::Result<(Vec<RequestView>, u64)> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT r.id, r.title, r.description, r.kind, r.status, \
                    r.requester_id, r.approver_id, r.created_at, \
                    ru.username AS requester_username, ru.role AS requester_role, \
                    au.username AS approver_username, au.role AS approver_role \
             FROM requests r \
             JOIN users ru ON ru.id = r.requester_id \
             JOIN users au ON au.id = r.approver_id \
             WHERE 1=1",
        );
        push_filters(&mut qb, filters);
        qb.push(" ORDER BY r.created_at DESC, r.id DESC");
        qb.push(" LIMIT ");
        qb.push_bind(limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind((page.saturating_sub(1) * limit) as i64);

        let rows: Vec<RequestViewRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let data = rows.into_iter().map(RequestView::from).collect();

        // Total matches before pagination. Filters only touch request
        // columns, so the join is not needed here.
        let mut count_qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM requests r WHERE 1=1");
        push_filters(&mut count_qb, filters);
        let count: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        Ok((data, count as u64))
    }

    // -- History Operations --

    async fn insert_history(&self, entry: &NewHistory) -> anyhow::Result<HistoryEntry> {
        let row = sqlx::query_as::<_, HistoryEntry>(
            r#"INSERT INTO history (action, comment, user_id, request_id)
               VALUES ($1, $2, $3, $4)
               RETURNING id, action, comment, user_id, request_id, created_at"#,
        )
        .bind(&entry.action)
        .bind(&entry.comment)
        .bind(entry.user_id)
        .bind(entry.request_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn history_for_request(&self, request_id: Uuid) -> anyhow::Result<Vec<HistoryView>> {
        let rows = sqlx::query_as::<_, HistoryViewRow>(
            r#"SELECT h.id, h.action, h.comment, h.user_id, h.request_id, h.created_at,
                      u.username, u.role
               FROM history h
               JOIN users u ON u.id = h.user_id
               WHERE h.request_id = $1
               ORDER BY h.created_at DESC, h.id DESC"#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(HistoryView::from).collect())
    }
}
