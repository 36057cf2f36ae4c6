use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserSummary;

/// Action labels written by the lifecycle engine. Status transitions use
/// the status wire string as their label instead.
pub mod actions {
    pub const CREATED: &str = "Creado";
    pub const UPDATED: &str = "Actualizado";
}

/// One immutable audit entry. Rows are only ever inserted; the engine
/// exposes no update or delete path for them.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryEntry {
    pub id: i64,
    pub action: String,
    pub comment: Option<String>,
    pub user_id: Uuid,
    pub request_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// History entry joined with the acting user's identity.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryView {
    #[serde(flatten)]
    pub entry: HistoryEntry,
    pub user: UserSummary,
}
