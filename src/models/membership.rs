use serde::{Deserialize, Serialize};

/// Role of a user within an organization.
///
/// `member` is a legacy alias for `employee`: it is accepted anywhere a role
/// string enters the system (request filters, database text) and normalized
/// immediately, so the alias never appears in responses or aggregation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Manager,
    #[serde(alias = "member")]
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "employee" | "member" => Ok(Role::Employee),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binds a user to an organization with a role.
///
/// Never hard-deleted: deactivation sets `deactivated_at` and the row keeps
/// showing up in listings (as inactive) and statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub user_id: String,
    pub org_id: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    pub created_at: i64,
    /// None = live membership, Some = deactivated at this time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated_at: Option<i64>,
}

impl Membership {
    pub fn is_active(&self) -> bool {
        self.deactivated_at.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMembership {
    pub user_id: String,
    pub role: Role,
    pub department_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRole {
    pub role: Role,
}

/// One row of the organization user listing: membership joined with the
/// user record and the department name. Internal shape; the wire-level
/// `UserSummary` is derived from it after redaction.
#[derive(Debug, Clone)]
pub struct MemberRow {
    pub membership_id: String,
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub status: crate::models::UserStatus,
    pub role: Role,
    pub is_active: bool,
    pub department: Option<String>,
    /// User creation time, the primary sort key of the listing.
    pub created_at: i64,
    /// Membership creation time.
    pub joined_at: i64,
}
