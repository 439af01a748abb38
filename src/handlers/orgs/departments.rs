use axum::extract::{Extension, State};

use crate::db::{queries, AppState};
use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::middleware::AuthContext;
use crate::models::CreateDepartment;
use crate::rbac::{self, Permission};

/// List the organization's departments. Requires membership.
pub async fn list_org_departments(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    rbac::require_membership(&conn, &ctx.user.id, &org_id)?;

    let departments = queries::list_departments(&conn, &org_id)?;
    Ok(Json(serde_json::json!({ "success": true, "data": departments })))
}

/// Create a department. Requires the manage_organization permission.
pub async fn create_org_department(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
    Json(input): Json<CreateDepartment>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    rbac::require_permission(&conn, &ctx.user.id, &org_id, Permission::ManageOrganization)?;

    input.validate()?;
    let department = queries::create_department(&conn, &org_id, &input)?;
    Ok(Json(serde_json::json!({ "success": true, "data": department })))
}
