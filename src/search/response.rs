//! Response envelope for the organization user search.

use serde::{Deserialize, Serialize};

use crate::models::{Role, UserStatus, UserSummary};
use crate::search::cursor::Cursor;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMeta {
    pub user_role: Role,
    pub can_see_emails: bool,
    pub organization_id: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RoleCounts {
    pub owner: i64,
    pub admin: i64,
    pub manager: i64,
    pub employee: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub active: i64,
    pub pending_activation: i64,
    pub inactive: i64,
}

/// Grouped counts over the *filtered* result set, recomputed per request.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_users: i64,
    pub active_users: i64,
    pub pending_activation: i64,
    pub inactive_users: i64,
    pub by_role: RoleCounts,
    pub by_status: StatusCounts,
}

impl AggregateStats {
    /// Fold grouped `(status, role, count)` rows into the stats block.
    ///
    /// Role text is parsed through `Role`, so a legacy `member` row lands
    /// in the employee bucket and the alias never becomes a key.
    pub fn from_counts(counts: &[(UserStatus, Role, i64)]) -> Self {
        let mut stats = Self::default();
        for &(status, role, count) in counts {
            stats.total_users += count;
            match status {
                UserStatus::Active => stats.by_status.active += count,
                UserStatus::PendingActivation => stats.by_status.pending_activation += count,
                UserStatus::Inactive => stats.by_status.inactive += count,
            }
            match role {
                Role::Owner => stats.by_role.owner += count,
                Role::Admin => stats.by_role.admin += count,
                Role::Manager => stats.by_role.manager += count,
                Role::Employee => stats.by_role.employee += count,
            }
        }
        stats.active_users = stats.by_status.active;
        stats.pending_activation = stats.by_status.pending_activation;
        stats.inactive_users = stats.by_status.inactive;
        stats
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Number of items on this page.
    pub count: i64,
    /// Requested page size.
    pub limit: i64,
    pub has_more: bool,
    pub next_cursor: Option<Cursor>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserSearchResponse {
    pub success: bool,
    pub data: Vec<UserSummary>,
    pub meta: SearchMeta,
    pub stats: AggregateStats,
    pub pagination: PageInfo,
}
