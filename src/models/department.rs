use serde::{Deserialize, Serialize};

use crate::error::{msg, AppError, Result};

/// Department within an organization. Memberships may reference one; the
/// department name is joined into user listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: String,
    pub org_id: String,
    pub name: String,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateDepartment {
    pub name: String,
}

impl CreateDepartment {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest(msg::NAME_EMPTY.into()));
        }
        Ok(())
    }
}
