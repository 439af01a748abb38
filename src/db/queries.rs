use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use rusqlite::{params, types::Value, Connection, ErrorCode};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::*;
use crate::search::filter::SearchFilterSpec;

use super::from_row::{
    query_all, query_one, DEPARTMENT_COLS, MEMBERSHIP_COLS, MEMBER_ROW_COLS, ORGANIZATION_COLS,
    USER_COLS,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a new API key with a recognizable prefix.
pub fn generate_api_key() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    format!("evk_{}", token)
}

/// Hash an API key for storage and lookup.
pub fn hash_api_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Map a UNIQUE constraint violation to a Conflict error; pass everything
/// else through as a database error.
fn map_unique(e: rusqlite::Error, conflict_msg: &str) -> AppError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::ConstraintViolation =>
        {
            AppError::Conflict(conflict_msg.to_string())
        }
        _ => AppError::Database(e),
    }
}

// ============ Users ============

/// Create a user in pending_activation state.
///
/// Returns the user and the plaintext API key (shown once).
pub fn create_user(conn: &Connection, input: &CreateUser) -> Result<(User, String)> {
    let id = gen_id();
    let now = now();
    let email = input.email.trim().to_lowercase();
    let api_key = generate_api_key();
    let api_key_hash = hash_api_key(&api_key);

    conn.execute(
        "INSERT INTO users (id, email, name, status, api_key_hash, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            &id,
            &email,
            &input.name,
            UserStatus::PendingActivation.as_ref(),
            &api_key_hash,
            now,
            now
        ],
    )
    .map_err(|e| map_unique(e, "Email already exists"))?;

    let user = User {
        id,
        email,
        name: input.name.clone(),
        status: UserStatus::PendingActivation,
        api_key_hash,
        created_at: now,
        updated_at: now,
    };
    Ok((user, api_key))
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let email = email.trim().to_lowercase();
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        &[&email],
    )
}

/// Resolve a plaintext API key to its user, if any.
pub fn get_user_by_api_key(conn: &Connection, api_key: &str) -> Result<Option<User>> {
    let hash = hash_api_key(api_key);
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE api_key_hash = ?1", USER_COLS),
        &[&hash],
    )
}

pub fn set_user_status(conn: &Connection, id: &str, status: UserStatus) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE users SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_ref(), now(), id],
    )?;
    Ok(affected > 0)
}

pub fn count_users(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}

// ============ Organizations ============

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

pub fn create_organization(conn: &Connection, input: &CreateOrganization) -> Result<Organization> {
    let id = gen_id();
    let now = now();
    let slug = slugify(&input.name);

    conn.execute(
        "INSERT INTO organizations (id, name, slug, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![&id, &input.name, &slug, now],
    )
    .map_err(|e| map_unique(e, "Organization slug already exists"))?;

    Ok(Organization {
        id,
        name: input.name.clone(),
        slug,
        created_at: now,
    })
}

pub fn get_organization_by_id(conn: &Connection, id: &str) -> Result<Option<Organization>> {
    query_one(
        conn,
        &format!("SELECT {} FROM organizations WHERE id = ?1", ORGANIZATION_COLS),
        &[&id],
    )
}

// ============ Departments ============

pub fn create_department(
    conn: &Connection,
    org_id: &str,
    input: &CreateDepartment,
) -> Result<Department> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO departments (id, org_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![&id, org_id, &input.name, now],
    )
    .map_err(|e| map_unique(e, "Department already exists in this organization"))?;

    Ok(Department {
        id,
        org_id: org_id.to_string(),
        name: input.name.clone(),
        created_at: now,
    })
}

pub fn get_department_by_id(conn: &Connection, id: &str) -> Result<Option<Department>> {
    query_one(
        conn,
        &format!("SELECT {} FROM departments WHERE id = ?1", DEPARTMENT_COLS),
        &[&id],
    )
}

pub fn list_departments(conn: &Connection, org_id: &str) -> Result<Vec<Department>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM departments WHERE org_id = ?1 ORDER BY name",
            DEPARTMENT_COLS
        ),
        &[&org_id],
    )
}

// ============ Memberships ============

pub fn create_membership(
    conn: &Connection,
    org_id: &str,
    input: &CreateMembership,
) -> Result<Membership> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO memberships (id, user_id, org_id, role, department_id, created_at, deactivated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)",
        params![
            &id,
            &input.user_id,
            org_id,
            input.role.as_str(),
            &input.department_id,
            now
        ],
    )
    .map_err(|e| map_unique(e, "User is already a member of this organization"))?;

    Ok(Membership {
        id,
        user_id: input.user_id.clone(),
        org_id: org_id.to_string(),
        role: input.role,
        department_id: input.department_id.clone(),
        created_at: now,
        deactivated_at: None,
    })
}

/// Live membership for (user, org), re-read on every call.
pub fn get_active_membership(
    conn: &Connection,
    user_id: &str,
    org_id: &str,
) -> Result<Option<Membership>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM memberships WHERE user_id = ?1 AND org_id = ?2 AND deactivated_at IS NULL",
            MEMBERSHIP_COLS
        ),
        &[&user_id, &org_id],
    )
}

pub fn get_membership_by_id(conn: &Connection, id: &str) -> Result<Option<Membership>> {
    query_one(
        conn,
        &format!("SELECT {} FROM memberships WHERE id = ?1", MEMBERSHIP_COLS),
        &[&id],
    )
}

pub fn update_membership_role(conn: &Connection, id: &str, role: Role) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE memberships SET role = ?1 WHERE id = ?2 AND deactivated_at IS NULL",
        params![role.as_str(), id],
    )?;
    Ok(affected > 0)
}

/// Soft-deactivate a membership. The row stays visible to listings and
/// statistics as inactive.
pub fn deactivate_membership(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE memberships SET deactivated_at = ?1 WHERE id = ?2 AND deactivated_at IS NULL",
        params![now(), id],
    )?;
    Ok(affected > 0)
}

pub fn reactivate_membership(conn: &Connection, id: &str) -> Result<bool> {
    let affected = conn
        .execute(
            "UPDATE memberships SET deactivated_at = NULL WHERE id = ?1 AND deactivated_at IS NOT NULL",
            params![id],
        )
        .map_err(|e| map_unique(e, "User already has a live membership in this organization"))?;
    Ok(affected > 0)
}

// ============ Member search ============

/// Build the WHERE clause shared by the page query and the aggregate query.
///
/// Values within a dimension OR-combine (SQL IN), dimensions AND-combine.
/// `with_page_bounds` additionally applies the cursor position; the ORDER BY
/// and LIMIT are appended by the callers.
fn member_filter_sql(
    org_id: &str,
    spec: &SearchFilterSpec,
    with_page_bounds: bool,
) -> (String, Vec<Value>) {
    let mut conditions = vec!["m.org_id = ?".to_string()];
    let mut values: Vec<Value> = vec![Value::Text(org_id.to_string())];

    if !spec.statuses.is_empty() {
        let placeholders = vec!["?"; spec.statuses.len()].join(", ");
        conditions.push(format!("u.status IN ({})", placeholders));
        for status in &spec.statuses {
            values.push(Value::Text(status.as_ref().to_string()));
        }
    }

    if !spec.roles.is_empty() {
        // Legacy rows may still carry 'member'; match it whenever the
        // canonical employee role is requested.
        let mut role_names: Vec<&str> = spec.roles.iter().map(|r| r.as_str()).collect();
        if spec.roles.contains(&Role::Employee) {
            role_names.push("member");
        }
        let placeholders = vec!["?"; role_names.len()].join(", ");
        conditions.push(format!("m.role IN ({})", placeholders));
        for name in role_names {
            values.push(Value::Text(name.to_string()));
        }
    }

    match spec.is_active {
        Some(true) => conditions.push("m.deactivated_at IS NULL".to_string()),
        Some(false) => conditions.push("m.deactivated_at IS NOT NULL".to_string()),
        None => {}
    }

    if let Some(from) = spec.created_from {
        conditions.push("u.created_at >= ?".to_string());
        values.push(Value::Integer(from));
    }
    if let Some(to) = spec.created_to {
        conditions.push("u.created_at <= ?".to_string());
        values.push(Value::Integer(to));
    }

    if let Some(ref term) = spec.search {
        conditions.push("(u.name LIKE ? OR u.email LIKE ?)".to_string());
        let pattern = format!("%{}%", term);
        values.push(Value::Text(pattern.clone()));
        values.push(Value::Text(pattern));
    }

    if with_page_bounds {
        if let Some(ref after) = spec.after {
            // Strictly after the cursor key in (created_at DESC, id DESC)
            conditions.push(
                "(u.created_at < ? OR (u.created_at = ? AND u.id < ?))".to_string(),
            );
            values.push(Value::Integer(after.ts));
            values.push(Value::Integer(after.ts));
            values.push(Value::Text(after.id.clone()));
        }
    }

    (format!("WHERE {}", conditions.join(" AND ")), values)
}

const MEMBER_JOIN: &str = "FROM memberships m \
     JOIN users u ON m.user_id = u.id \
     LEFT JOIN departments d ON m.department_id = d.id";

/// Fetch one page of the filtered member listing, ordered by
/// `(u.created_at DESC, u.id DESC)`.
///
/// Fetches `limit + 1` rows; the extra probe row lets the caller detect
/// `hasMore` without a separate count query.
pub fn fetch_members_page(
    conn: &Connection,
    org_id: &str,
    spec: &SearchFilterSpec,
) -> Result<Vec<MemberRow>> {
    let (where_clause, mut values) = member_filter_sql(org_id, spec, true);
    values.push(Value::Integer(spec.limit + 1));

    let sql = format!(
        "SELECT {} {} {} ORDER BY u.created_at DESC, u.id DESC LIMIT ?",
        MEMBER_ROW_COLS, MEMBER_JOIN, where_clause
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(values), |row| {
            use super::from_row::FromRow;
            MemberRow::from_row(row)
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Grouped `(status, role, count)` over the same filter predicate as the
/// page query, without pagination bounds. Legacy `member` rows are folded
/// into the employee bucket inside SQL so the alias never surfaces.
pub fn fetch_aggregate_counts(
    conn: &Connection,
    org_id: &str,
    spec: &SearchFilterSpec,
) -> Result<Vec<(UserStatus, Role, i64)>> {
    let (where_clause, values) = member_filter_sql(org_id, spec, false);

    let sql = format!(
        "SELECT u.status, \
                CASE WHEN m.role = 'member' THEN 'employee' ELSE m.role END AS role, \
                COUNT(*) \
         {} {} GROUP BY u.status, role",
        MEMBER_JOIN, where_clause
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(values), |row| {
            let status: String = row.get(0)?;
            let role: String = row.get(1)?;
            let count: i64 = row.get(2)?;
            Ok((status, role, count))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut counts = Vec::with_capacity(rows.len());
    for (status, role, count) in rows {
        let status: UserStatus = status
            .parse()
            .map_err(|_| AppError::Internal(format!("Invalid status in database: {}", status)))?;
        let role: Role = role
            .parse()
            .map_err(|_| AppError::Internal(format!("Invalid role in database: {}", role)))?;
        counts.push((status, role, count));
    }
    Ok(counts)
}

/// Single member listing row for the user detail endpoint.
pub fn fetch_member_row(
    conn: &Connection,
    org_id: &str,
    user_id: &str,
) -> Result<Option<MemberRow>> {
    let sql = format!(
        "SELECT {} {} WHERE m.org_id = ?1 AND m.user_id = ?2 \
         ORDER BY m.deactivated_at IS NOT NULL, m.created_at DESC LIMIT 1",
        MEMBER_ROW_COLS, MEMBER_JOIN
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![org_id, user_id], |row| {
        use super::from_row::FromRow;
        MemberRow::from_row(row)
    })?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}
