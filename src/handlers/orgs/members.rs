use axum::extract::{Extension, State};
use serde::Deserialize;

use crate::db::{queries, AppState};
use crate::error::{msg, AppError, Result};
use crate::extractors::{Json, Path};
use crate::middleware::AuthContext;
use crate::models::{CreateMembership, CreateUser, Membership, Role, UpdateMemberRole};
use crate::rbac::{self, Permission};

#[derive(Debug, Deserialize)]
pub struct CreateOrgMemberRequest {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub department_id: Option<String>,
}

/// Add a member to the organization. Requires the create_users permission;
/// granting the owner role additionally requires the owner role.
///
/// If no user exists for the email, one is created in pending_activation
/// state and its API key is returned once in the response.
pub async fn create_org_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(org_id): Path<String>,
    Json(input): Json<CreateOrgMemberRequest>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    rbac::require_permission(&conn, &ctx.user.id, &org_id, Permission::CreateUsers)?;
    if input.role == Role::Owner {
        rbac::require_role_at_least(&conn, &ctx.user.id, &org_id, Role::Owner)?;
    }

    if let Some(ref department_id) = input.department_id {
        let department = queries::get_department_by_id(&conn, department_id)?
            .ok_or_else(|| AppError::BadRequest(msg::DEPARTMENT_NOT_FOUND.into()))?;
        if department.org_id != org_id {
            return Err(AppError::BadRequest(msg::DEPARTMENT_NOT_FOUND.into()));
        }
    }

    let (user, api_key) = match queries::get_user_by_email(&conn, &input.email)? {
        Some(existing) => (existing, None),
        None => {
            let create = CreateUser {
                email: input.email.clone(),
                name: input.name.clone(),
            };
            create.validate()?;
            let (user, key) = queries::create_user(&conn, &create)?;
            (user, Some(key))
        }
    };

    let membership = queries::create_membership(
        &conn,
        &org_id,
        &CreateMembership {
            user_id: user.id.clone(),
            role: input.role,
            department_id: input.department_id.clone(),
        },
    )?;

    tracing::info!(org_id = %org_id, user_id = %user.id, role = %input.role, "member added");

    Ok(Json(serde_json::json!({
        "success": true,
        "data": membership,
        "apiKey": api_key,
    })))
}

#[derive(Deserialize)]
pub struct OrgMemberPath {
    pub org_id: String,
    pub member_id: String,
}

/// Look up a membership, mapping a missing row or an org mismatch to the
/// same NotFound so ids don't leak across tenants.
fn get_org_membership(
    conn: &rusqlite::Connection,
    org_id: &str,
    member_id: &str,
) -> Result<Membership> {
    let membership = queries::get_membership_by_id(conn, member_id)?
        .ok_or_else(|| AppError::NotFound(msg::MEMBER_NOT_FOUND.into()))?;
    if membership.org_id != org_id {
        return Err(AppError::NotFound(msg::MEMBER_NOT_FOUND.into()));
    }
    Ok(membership)
}

/// Change a member's role. Requires admin or above; touching the owner
/// role (either direction) requires the owner role.
pub async fn update_member_role(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(path): Path<OrgMemberPath>,
    Json(input): Json<UpdateMemberRole>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    rbac::require_role_at_least(&conn, &ctx.user.id, &path.org_id, Role::Admin)?;

    let existing = get_org_membership(&conn, &path.org_id, &path.member_id)?;

    // Role updates only touch live rows; a deactivated membership has no
    // active role to change.
    if !existing.is_active() {
        return Err(AppError::NotFound(msg::MEMBER_NOT_FOUND.into()));
    }
    if existing.user_id == ctx.user.id {
        return Err(AppError::BadRequest(msg::CANNOT_CHANGE_OWN_ROLE.into()));
    }
    if input.role == Role::Owner || existing.role == Role::Owner {
        rbac::require_role_at_least(&conn, &ctx.user.id, &path.org_id, Role::Owner)?;
    }

    queries::update_membership_role(&conn, &path.member_id, input.role)?;

    let updated = get_org_membership(&conn, &path.org_id, &path.member_id)?;
    Ok(Json(serde_json::json!({ "success": true, "data": updated })))
}

/// Soft-deactivate a membership. Requires the delete_users permission.
pub async fn deactivate_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(path): Path<OrgMemberPath>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    rbac::require_permission(&conn, &ctx.user.id, &path.org_id, Permission::DeleteUsers)?;

    let existing = get_org_membership(&conn, &path.org_id, &path.member_id)?;
    if existing.user_id == ctx.user.id {
        return Err(AppError::BadRequest(msg::CANNOT_DEACTIVATE_SELF.into()));
    }

    queries::deactivate_membership(&conn, &path.member_id)?;
    tracing::info!(org_id = %path.org_id, member_id = %path.member_id, "member deactivated");

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Reactivate a deactivated membership. Requires the edit_users permission.
pub async fn reactivate_member(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(path): Path<OrgMemberPath>,
) -> Result<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    rbac::require_permission(&conn, &ctx.user.id, &path.org_id, Permission::EditUsers)?;

    get_org_membership(&conn, &path.org_id, &path.member_id)?;
    queries::reactivate_membership(&conn, &path.member_id)?;

    let updated = get_org_membership(&conn, &path.org_id, &path.member_id)?;
    Ok(Json(serde_json::json!({ "success": true, "data": updated })))
}
