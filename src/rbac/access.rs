//! Authorization guards over membership state.
//!
//! Every guard re-reads the membership row at call time instead of caching
//! it, so a role revoked mid-flight is observed by the next check. All
//! guards are read-only.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::{msg, AppError, Result};
use crate::models::{Membership, Role};
use crate::rbac::Permission;

/// Require a live membership for `user_id` in `org_id`.
///
/// `NotFound` if the organization does not exist, `Forbidden` if the user
/// has no live membership in it.
pub fn require_membership(conn: &Connection, user_id: &str, org_id: &str) -> Result<Membership> {
    queries::get_organization_by_id(conn, org_id)?
        .ok_or_else(|| AppError::NotFound(msg::ORG_NOT_FOUND.into()))?;

    queries::get_active_membership(conn, user_id, org_id)?
        .ok_or_else(|| AppError::Forbidden(msg::NOT_A_MEMBER.into()))
}

/// Require a live membership whose role grants `permission`.
///
/// The `Forbidden` error names the missing permission for diagnostics.
pub fn require_permission(
    conn: &Connection,
    user_id: &str,
    org_id: &str,
    permission: Permission,
) -> Result<Membership> {
    let membership = require_membership(conn, user_id, org_id)?;
    if membership.role.allows(permission) {
        Ok(membership)
    } else {
        Err(AppError::Forbidden(format!(
            "Missing permission: {}",
            permission.as_ref()
        )))
    }
}

/// Require a live membership with at least `min_role` in the hierarchy.
pub fn require_role_at_least(
    conn: &Connection,
    user_id: &str,
    org_id: &str,
    min_role: Role,
) -> Result<Membership> {
    let membership = require_membership(conn, user_id, org_id)?;
    if membership.role.at_least(min_role) {
        Ok(membership)
    } else {
        Err(AppError::Forbidden(format!(
            "Requires role {} or above",
            min_role
        )))
    }
}

/// Non-throwing variant of `require_permission` for conditional behavior.
///
/// Authorization misses (no org, no membership, insufficient role) map to
/// `false`; only infrastructure errors propagate.
pub fn has_permission(
    conn: &Connection,
    user_id: &str,
    org_id: &str,
    permission: Permission,
) -> Result<bool> {
    match require_permission(conn, user_id, org_id, permission) {
        Ok(_) => Ok(true),
        Err(AppError::Forbidden(_)) | Err(AppError::NotFound(_)) => Ok(false),
        Err(e) => Err(e),
    }
}
