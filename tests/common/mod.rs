//! Test utilities and fixtures for EvoTrack integration tests

#![allow(dead_code)]

use axum::Router;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

pub use evotrack::db::{init_db, queries, AppState};
pub use evotrack::models::*;
pub use evotrack::rbac;
pub use evotrack::search;

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create a test organization
pub fn create_test_org(conn: &Connection, name: &str) -> Organization {
    let input = CreateOrganization {
        name: name.to_string(),
    };
    queries::create_organization(conn, &input).expect("Failed to create test organization")
}

/// Create a test user; returns the user and its plaintext API key
pub fn create_test_user(conn: &Connection, email: &str, name: &str) -> (User, String) {
    let input = CreateUser {
        email: email.to_string(),
        name: name.to_string(),
    };
    queries::create_user(conn, &input).expect("Failed to create test user")
}

/// Create a test member: user (active by default) plus membership.
/// Returns the user, membership, and the user's API key.
pub fn create_test_member(
    conn: &Connection,
    org_id: &str,
    email: &str,
    role: Role,
) -> (User, Membership, String) {
    let (user, api_key) = create_test_user(conn, email, &format!("Test {}", email));
    queries::set_user_status(conn, &user.id, UserStatus::Active)
        .expect("Failed to activate test user");
    let membership = queries::create_membership(
        conn,
        org_id,
        &CreateMembership {
            user_id: user.id.clone(),
            role,
            department_id: None,
        },
    )
    .expect("Failed to create test membership");
    let user = queries::get_user_by_id(conn, &user.id)
        .expect("Failed to reload test user")
        .expect("Test user missing");
    (user, membership, api_key)
}

/// Override a user's created_at to control listing order in tests
pub fn backdate_user(conn: &Connection, user_id: &str, created_at: i64) {
    conn.execute(
        "UPDATE users SET created_at = ?1 WHERE id = ?2",
        rusqlite::params![created_at, user_id],
    )
    .expect("Failed to backdate test user");
}

/// Insert a membership carrying the legacy 'member' role text directly,
/// bypassing normalization at the model boundary
pub fn insert_legacy_member_row(conn: &Connection, org_id: &str, user_id: &str) {
    conn.execute(
        "INSERT INTO memberships (id, user_id, org_id, role, department_id, created_at, deactivated_at)
         VALUES (?1, ?2, ?3, 'member', NULL, ?4, NULL)",
        rusqlite::params![uuid::Uuid::new_v4().to_string(), user_id, org_id, now()],
    )
    .expect("Failed to insert legacy member row");
}

/// Get the current timestamp
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Get a past timestamp (days ago)
pub fn past_timestamp(days: i64) -> i64 {
    now() - (days * 86400)
}

/// Create an AppState for testing with an in-memory database.
///
/// Pool size 1 so every request sees the same in-memory database.
pub fn create_test_app_state() -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }
    AppState { db: pool }
}

/// Build the application router plus its state for HTTP-level tests
pub fn test_app() -> (Router, AppState) {
    let state = create_test_app_state();
    (evotrack::handlers::app(state.clone()), state)
}
