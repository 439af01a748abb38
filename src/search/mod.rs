//! Filtered, cursor-paginated organization user search with live
//! aggregate statistics.
//!
//! The whole operation is read-only and runs inside a single read
//! transaction, so the caller sees it as atomic: either the full
//! `(items, stats, nextCursor)` triple from one snapshot, or an error,
//! never partial results.

pub mod cursor;
pub mod filter;
pub mod response;

pub use cursor::{Cursor, CursorKey};
pub use filter::{SearchFilterSpec, UserSearchRequest};
pub use response::{AggregateStats, PageInfo, SearchMeta, UserSearchResponse};

use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::models::{Role, UserSummary};
use crate::rbac;

/// Run the org user search for `requester_id`.
///
/// 1. Verify the requester's membership (also establishes their role for
///    email redaction: owner/admin see full emails of other members, the
///    rest see redacted emails of everyone but themselves).
/// 2. Fetch `limit + 1` rows after the cursor position; the probe row is
///    trimmed and only signals `hasMore`.
/// 3. Compute grouped stats over the same filter predicate without
///    pagination bounds.
pub fn search_org_users(
    conn: &Connection,
    org_id: &str,
    requester_id: &str,
    spec: &SearchFilterSpec,
) -> Result<UserSearchResponse> {
    // One read transaction for the membership check, the page, and the
    // stats: a write committed on another pooled connection mid-operation
    // must not make the stats disagree with the items.
    let tx = conn.unchecked_transaction()?;

    let membership = rbac::require_membership(&tx, requester_id, org_id)?;
    let can_see_emails = membership.role.at_least(Role::Admin);

    let mut rows = queries::fetch_members_page(&tx, org_id, spec)?;

    let has_more = rows.len() as i64 > spec.limit;
    if has_more {
        rows.truncate(spec.limit as usize);
    }

    let next_cursor = if has_more {
        rows.last()
            .map(|row| Cursor::encode(&row.user_id, row.created_at))
    } else {
        None
    };

    let counts = queries::fetch_aggregate_counts(&tx, org_id, spec)?;
    let stats = AggregateStats::from_counts(&counts);
    tx.commit()?;

    let data: Vec<UserSummary> = rows
        .iter()
        .map(|row| {
            let show_email = can_see_emails || row.user_id == requester_id;
            UserSummary::from_member_row(row, show_email)
        })
        .collect();

    Ok(UserSearchResponse {
        success: true,
        pagination: PageInfo {
            count: data.len() as i64,
            limit: spec.limit,
            has_more,
            next_cursor,
        },
        meta: SearchMeta {
            user_role: membership.role,
            can_see_emails,
            organization_id: org_id.to_string(),
        },
        stats,
        data,
    })
}
