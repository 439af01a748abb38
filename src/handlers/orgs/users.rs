use axum::extract::{Extension, State};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::AuthContext;
use crate::models::{Role, UserSummary};
use crate::rbac::{self, Permission};
use crate::search::{self, AggregateStats, SearchFilterSpec, UserSearchRequest, UserSearchResponse};

/// Search users in an organization with filters, cursor pagination, and
/// aggregate statistics. Requires membership; email visibility depends on
/// the caller's role.
pub async fn search_org_users(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
    Json(body): Json<UserSearchRequest>,
) -> Result<Json<UserSearchResponse>> {
    let conn = state.db.get()?;
    let spec = body.compose()?;
    let response = search::search_org_users(&conn, &org_id, &ctx.user.id, &spec)?;
    Ok(Json(response))
}

/// Unfiltered user statistics for an organization. Requires the
/// view_users permission.
pub async fn get_org_user_stats(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    rbac::require_permission(&conn, &ctx.user.id, &org_id, Permission::ViewUsers)?;

    let counts = queries::fetch_aggregate_counts(&conn, &org_id, &SearchFilterSpec::unfiltered())?;
    let stats = AggregateStats::from_counts(&counts);

    Ok(Json(serde_json::json!({ "success": true, "stats": stats })))
}

#[derive(serde::Deserialize)]
pub struct OrgUserPath {
    pub org_id: String,
    pub user_id: String,
}

/// Get one user's listing row in organization context (role, department,
/// membership state). Requires membership; email redacted per viewer role.
pub async fn get_org_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(path): Path<OrgUserPath>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let membership = rbac::require_membership(&conn, &ctx.user.id, &path.org_id)?;

    let row = queries::fetch_member_row(&conn, &path.org_id, &path.user_id)?
        .ok_or_else(|| AppError::NotFound(msg::USER_NOT_FOUND.into()))?;

    let show_email = membership.role.at_least(Role::Admin) || row.user_id == ctx.user.id;
    let summary = UserSummary::from_member_row(&row, show_email);

    Ok(Json(serde_json::json!({ "success": true, "data": summary })))
}
