use axum::extract::{Extension, State};

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::AuthContext;
use crate::models::{CreateMembership, CreateOrganization, Role};
use crate::rbac;

/// Create an organization. Any authenticated user may create one and
/// becomes its owner.
pub async fn create_org(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(input): Json<CreateOrganization>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    input.validate()?;

    let org = queries::create_organization(&conn, &input)?;
    queries::create_membership(
        &conn,
        &org.id,
        &CreateMembership {
            user_id: ctx.user.id.clone(),
            role: Role::Owner,
            department_id: None,
        },
    )?;

    tracing::info!(org_id = %org.id, user_id = %ctx.user.id, "organization created");

    Ok(Json(serde_json::json!({ "success": true, "data": org })))
}

/// Get an organization. Requires membership.
pub async fn get_org(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    rbac::require_membership(&conn, &ctx.user.id, &org_id)?;

    let org = queries::get_organization_by_id(&conn, &org_id)?
        .ok_or_else(|| AppError::NotFound(msg::ORG_NOT_FOUND.into()))?;

    Ok(Json(serde_json::json!({ "success": true, "data": org })))
}
