//! Filter composition for the organization user search.
//!
//! Every recognized filter dimension is validated and normalized here, in
//! one place, instead of ad hoc conditional query building per endpoint.
//! Values within a dimension combine with OR; dimensions combine with AND.

use serde::Deserialize;

use crate::error::{msg, AppError, Result};
use crate::models::{Role, UserStatus};
use crate::search::cursor::{Cursor, CursorKey};
use crate::util;

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Raw search request body, as received on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSearchRequest {
    pub limit: Option<i64>,
    pub next_cursor: Option<serde_json::Value>,
    pub search: Option<String>,
    pub status: Option<Vec<String>>,
    pub role: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
}

/// Normalized, validated filter specification, ready for query building.
///
/// Empty vectors mean "dimension not filtered".
#[derive(Debug, Clone, Default)]
pub struct SearchFilterSpec {
    pub statuses: Vec<UserStatus>,
    pub roles: Vec<Role>,
    pub is_active: Option<bool>,
    pub created_from: Option<i64>,
    pub created_to: Option<i64>,
    pub search: Option<String>,
    pub limit: i64,
    pub after: Option<CursorKey>,
}

impl SearchFilterSpec {
    /// Spec with no filters and the default page size; used by the
    /// unfiltered stats endpoint.
    pub fn unfiltered() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            ..Default::default()
        }
    }
}

impl UserSearchRequest {
    /// Validate and normalize into a `SearchFilterSpec`.
    ///
    /// Policy: an explicit out-of-range limit is a client error, not
    /// silently clamped; only an absent limit falls back to the default.
    pub fn compose(&self) -> Result<SearchFilterSpec> {
        let limit = match self.limit {
            None => DEFAULT_LIMIT,
            Some(l) if (1..=MAX_LIMIT).contains(&l) => l,
            Some(_) => return Err(AppError::Validation(msg::LIMIT_OUT_OF_RANGE.into())),
        };

        let statuses = parse_statuses(self.status.as_deref().unwrap_or_default())?;
        let roles = parse_roles(self.role.as_deref().unwrap_or_default())?;

        let created_from = self
            .created_from
            .as_deref()
            .map(|s| parse_date_field("createdFrom", s))
            .transpose()?;
        let created_to = self
            .created_to
            .as_deref()
            .map(|s| parse_date_field("createdTo", s))
            .transpose()?;
        if let (Some(from), Some(to)) = (created_from, created_to) {
            if to < from {
                return Err(AppError::Validation(msg::DATE_RANGE_INVERTED.into()));
            }
        }

        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let after = self
            .next_cursor
            .as_ref()
            .map(|raw| Cursor::from_value(raw)?.decode())
            .transpose()?;

        Ok(SearchFilterSpec {
            statuses,
            roles,
            is_active: self.is_active,
            created_from,
            created_to,
            search,
            limit,
            after,
        })
    }
}

/// Parse status values case-insensitively, naming the offending value on
/// failure. Duplicates are dropped silently.
fn parse_statuses(values: &[String]) -> Result<Vec<UserStatus>> {
    let mut out = Vec::new();
    for value in values {
        let status: UserStatus = value
            .to_lowercase()
            .parse()
            .map_err(|_| AppError::Validation(format!("Unknown status value: {}", value)))?;
        if !out.contains(&status) {
            out.push(status);
        }
    }
    Ok(out)
}

/// Parse role values case-insensitively; `member` normalizes to employee.
fn parse_roles(values: &[String]) -> Result<Vec<Role>> {
    let mut out = Vec::new();
    for value in values {
        let role: Role = value
            .to_lowercase()
            .parse()
            .map_err(|_| AppError::Validation(format!("Unknown role value: {}", value)))?;
        if !out.contains(&role) {
            out.push(role);
        }
    }
    Ok(out)
}

fn parse_date_field(field: &str, value: &str) -> Result<i64> {
    util::parse_datetime(value)
        .ok_or_else(|| AppError::Validation(format!("Invalid {} datetime: {}", field, value)))
}
