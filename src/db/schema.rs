use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Users (identity - source of truth for name/email)
        -- status: admin-created users start pending_activation
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('active', 'pending_activation', 'inactive')),
            api_key_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);
        CREATE INDEX IF NOT EXISTS idx_users_created ON users(created_at, id);
        CREATE INDEX IF NOT EXISTS idx_users_api_key ON users(api_key_hash);

        -- Organizations (tenancy boundary)
        CREATE TABLE IF NOT EXISTS organizations (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL
        );

        -- Departments (org-scoped, referenced by memberships)
        CREATE TABLE IF NOT EXISTS departments (
            id TEXT PRIMARY KEY,
            org_id TEXT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL,

            UNIQUE(org_id, name)
        );
        CREATE INDEX IF NOT EXISTS idx_departments_org ON departments(org_id);

        -- Memberships (user <-> org role binding)
        -- Soft-deactivated: deactivated_at set, row kept for listings/stats.
        -- 'member' remains in the role CHECK for legacy rows; it reads back
        -- as employee everywhere.
        CREATE TABLE IF NOT EXISTS memberships (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            org_id TEXT NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            role TEXT NOT NULL CHECK (role IN ('owner', 'admin', 'manager', 'employee', 'member')),
            department_id TEXT REFERENCES departments(id) ON DELETE SET NULL,
            created_at INTEGER NOT NULL,
            deactivated_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_memberships_org ON memberships(org_id);
        CREATE INDEX IF NOT EXISTS idx_memberships_user ON memberships(user_id);
        -- At most one live membership per (user, organization)
        CREATE UNIQUE INDEX IF NOT EXISTS idx_memberships_live
            ON memberships(user_id, org_id) WHERE deactivated_at IS NULL;
        "#,
    )?;
    Ok(())
}
