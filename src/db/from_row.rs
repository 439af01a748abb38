//! Row mapping trait and helpers for reducing boilerplate in queries.
//!
//! This module provides a `FromRow` trait that models can implement to
//! define how they are constructed from database rows, plus helper functions
//! for common query patterns.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors.
///
/// This provides graceful error handling instead of panicking when the
/// database contains invalid enum values (corruption, migration drift).
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str = "id, email, name, status, api_key_hash, created_at, updated_at";

pub const ORGANIZATION_COLS: &str = "id, name, slug, created_at";

pub const DEPARTMENT_COLS: &str = "id, org_id, name, created_at";

pub const MEMBERSHIP_COLS: &str =
    "id, user_id, org_id, role, department_id, created_at, deactivated_at";

/// Columns of the member listing join (memberships m, users u, departments d).
pub const MEMBER_ROW_COLS: &str = "m.id, m.user_id, u.email, u.name, u.status, m.role, m.deactivated_at, d.name, u.created_at, m.created_at";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            status: parse_enum(row, 3, "status")?,
            api_key_hash: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl FromRow for Organization {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Organization {
            id: row.get(0)?,
            name: row.get(1)?,
            slug: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for Department {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Department {
            id: row.get(0)?,
            org_id: row.get(1)?,
            name: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for Membership {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Membership {
            id: row.get(0)?,
            user_id: row.get(1)?,
            org_id: row.get(2)?,
            role: parse_enum(row, 3, "role")?,
            department_id: row.get(4)?,
            created_at: row.get(5)?,
            deactivated_at: row.get(6)?,
        })
    }
}

impl FromRow for MemberRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let deactivated_at: Option<i64> = row.get(6)?;
        Ok(MemberRow {
            membership_id: row.get(0)?,
            user_id: row.get(1)?,
            email: row.get(2)?,
            name: row.get(3)?,
            status: parse_enum(row, 4, "status")?,
            role: parse_enum(row, 5, "role")?,
            is_active: deactivated_at.is_none(),
            department: row.get(7)?,
            created_at: row.get(8)?,
            joined_at: row.get(9)?,
        })
    }
}
