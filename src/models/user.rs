use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::error::{msg, AppError, Result};
use crate::util;

/// Basic email format validation.
///
/// Validates that email has:
/// - Exactly one @ symbol
/// - Non-empty local part (before @)
/// - Non-empty domain part (after @) with at least one dot
///
/// This is intentionally permissive to avoid rejecting valid but unusual
/// emails. It's not meant to be RFC 5322 compliant - just a sanity check.
fn validate_email_format(email: &str) -> Result<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(AppError::BadRequest(msg::EMAIL_EMPTY.into()));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(AppError::BadRequest(msg::INVALID_EMAIL_FORMAT.into()));
    }

    let local_part = parts[0];
    let domain_part = parts[1];

    if local_part.is_empty() || local_part.contains(' ') {
        return Err(AppError::BadRequest(msg::INVALID_EMAIL_FORMAT.into()));
    }

    if domain_part.is_empty() || !domain_part.contains('.') {
        return Err(AppError::BadRequest(msg::INVALID_EMAIL_FORMAT.into()));
    }

    if domain_part.starts_with('.') || domain_part.ends_with('.') {
        return Err(AppError::BadRequest(msg::INVALID_EMAIL_FORMAT.into()));
    }

    Ok(())
}

/// Account lifecycle status.
///
/// Admin-created users start as `pending_activation` and become `active`
/// once they accept the invite; deactivation flips them to `inactive`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserStatus {
    Active,
    PendingActivation,
    Inactive,
}

/// User identity - source of truth for name/email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub status: UserStatus,
    #[serde(skip_serializing)]
    pub api_key_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
}

impl CreateUser {
    pub fn validate(&self) -> Result<()> {
        validate_email_format(&self.email)?;
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        Ok(())
    }
}

/// Wire-level row of the organization user listing.
///
/// Timestamps are RFC 3339 strings; `email` may be redacted depending on
/// the viewer's role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub name: String,
    pub status: UserStatus,
    pub role: crate::models::Role,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub created_at: String,
    pub joined_at: String,
}

impl UserSummary {
    /// Build the wire row from a listing row, redacting the email unless
    /// the viewer is allowed to see it.
    pub fn from_member_row(row: &crate::models::MemberRow, show_email: bool) -> Self {
        let email = if show_email {
            row.email.clone()
        } else {
            util::redact_email(&row.email)
        };
        Self {
            id: row.user_id.clone(),
            email,
            name: row.name.clone(),
            status: row.status,
            role: row.role,
            is_active: row.is_active,
            department: row.department.clone(),
            created_at: util::to_rfc3339(row.created_at),
            joined_at: util::to_rfc3339(row.joined_at),
        }
    }
}
