//! Role-based access control.
//!
//! The role -> permission mapping is immutable process-wide configuration:
//! static tables, no synchronization, no runtime mutation. The owner role
//! carries a distinguished wildcard grant instead of an enumerated set.

mod access;

pub use access::*;

use serde::Serialize;
use strum::{AsRefStr, EnumString};

use crate::models::Role;

/// Fine-grained capability token.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
    // User management
    ViewUsers,
    CreateUsers,
    EditUsers,
    DeleteUsers,

    // Project management
    ViewProjects,
    CreateProjects,
    EditProjects,
    DeleteProjects,

    // Timesheet management
    ViewOwnTimesheet,
    EditOwnTimesheet,
    ViewAllTimesheets,
    ApproveTimesheets,

    // Reports
    ViewReports,
    ExportReports,

    // Admin
    ManageOrganization,
    ManageSettings,
}

/// The full permission catalog, used by tests and by the owner wildcard.
pub const ALL_PERMISSIONS: &[Permission] = &[
    Permission::ViewUsers,
    Permission::CreateUsers,
    Permission::EditUsers,
    Permission::DeleteUsers,
    Permission::ViewProjects,
    Permission::CreateProjects,
    Permission::EditProjects,
    Permission::DeleteProjects,
    Permission::ViewOwnTimesheet,
    Permission::EditOwnTimesheet,
    Permission::ViewAllTimesheets,
    Permission::ApproveTimesheets,
    Permission::ViewReports,
    Permission::ExportReports,
    Permission::ManageOrganization,
    Permission::ManageSettings,
];

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::ViewUsers,
    Permission::CreateUsers,
    Permission::EditUsers,
    Permission::ViewProjects,
    Permission::CreateProjects,
    Permission::EditProjects,
    Permission::ViewOwnTimesheet,
    Permission::EditOwnTimesheet,
    Permission::ViewAllTimesheets,
    Permission::ApproveTimesheets,
    Permission::ViewReports,
    Permission::ExportReports,
    Permission::ManageSettings,
];

const MANAGER_PERMISSIONS: &[Permission] = &[
    Permission::ViewUsers,
    Permission::ViewProjects,
    Permission::CreateProjects,
    Permission::EditProjects,
    Permission::ViewOwnTimesheet,
    Permission::EditOwnTimesheet,
    Permission::ViewAllTimesheets,
    Permission::ApproveTimesheets,
    Permission::ViewReports,
];

const EMPLOYEE_PERMISSIONS: &[Permission] = &[
    Permission::ViewProjects,
    Permission::ViewOwnTimesheet,
    Permission::EditOwnTimesheet,
];

/// What a role is allowed to do: either everything (owner) or a fixed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleGrant {
    All,
    Only(&'static [Permission]),
}

impl Role {
    /// The static permission grant for this role.
    pub fn grant(self) -> RoleGrant {
        match self {
            Role::Owner => RoleGrant::All,
            Role::Admin => RoleGrant::Only(ADMIN_PERMISSIONS),
            Role::Manager => RoleGrant::Only(MANAGER_PERMISSIONS),
            Role::Employee => RoleGrant::Only(EMPLOYEE_PERMISSIONS),
        }
    }

    /// Privilege level, higher = more privileged.
    pub fn rank(self) -> u8 {
        match self {
            Role::Owner => 4,
            Role::Admin => 3,
            Role::Manager => 2,
            Role::Employee => 1,
        }
    }

    /// Role hierarchy comparison: true iff this role is at least as
    /// privileged as `required`. Reflexive.
    pub fn at_least(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    /// Whether this role's grant covers `permission`.
    pub fn allows(self, permission: Permission) -> bool {
        match self.grant() {
            RoleGrant::All => true,
            RoleGrant::Only(set) => set.contains(&permission),
        }
    }
}
