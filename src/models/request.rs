use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::history::HistoryView;
use crate::models::user::UserSummary;

/// An approval request. Requests are never deleted; they only move between
/// statuses, and every move leaves a history row behind.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Request {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: RequestStatus,
    pub requester_id: Uuid,
    pub approver_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Request lifecycle status. Stored as its wire string ("Pending",
/// "Approved", "Rejected") so existing rows and clients keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    /// Wire string for this status; doubles as the history action label
    /// written on a transition.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
        }
    }
}

/// Partial edit applied to a rejected request. Absent fields keep their
/// prior value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub approver_id: Option<Uuid>,
}

/// Optional predicates for request listings. Absent fields add no
/// predicate; present fields compose conjunctively.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestFilters {
    pub search: Option<String>,
    pub status: Option<RequestStatus>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub requester_id: Option<Uuid>,
    pub approver_id: Option<Uuid>,
}

/// A request joined with the identities of its requester and approver.
#[derive(Debug, Clone, Serialize)]
pub struct RequestView {
    #[serde(flatten)]
    pub request: Request,
    pub requester: UserSummary,
    pub approver: UserSummary,
}

/// Full read model for a single request: identities plus the audit trail,
/// newest entry first.
#[derive(Debug, Clone, Serialize)]
pub struct RequestDetail {
    #[serde(flatten)]
    pub view: RequestView,
    pub history: Vec<HistoryView>,
}

/// One page of a filtered listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub count: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}
