//! Database migrations
//!
//! This module provides database schema migration functionality with version tracking.

use crate::core::error::{LmsError, Result};
use rusqlite::Connection;
use tracing::info;

/// Migration version tracking table
const MIGRATION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at DATETIME DEFAULT CURRENT_TIMESTAMP
)
"#;

/// Initial schema migration (version 1)
const MIGRATION_V1: &str = r#"
-- HR users table (administrators who own employees and modules)
CREATE TABLE IF NOT EXISTS hr_users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'hr',
    department TEXT NOT NULL DEFAULT 'Human Resources',
    avatar TEXT,
    reset_token TEXT,
    reset_token_expiry INTEGER,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Employees table (onboarded by an owning HR user)
CREATE TABLE IF NOT EXISTS employees (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    department TEXT NOT NULL,
    identity_number TEXT,
    phone_number TEXT,
    position TEXT,
    hr_id TEXT NOT NULL,
    password_hash TEXT,
    is_password_set INTEGER NOT NULL DEFAULT 0,
    setup_token TEXT,
    setup_token_expiry INTEGER,
    is_active INTEGER NOT NULL DEFAULT 1,
    last_login_at TEXT,
    avatar TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (hr_id) REFERENCES hr_users(id) ON DELETE CASCADE
);

-- Legacy generic users table (secondary authentication path)
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT UNIQUE NOT NULL,
    password_hash TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    is_password_set INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Learning modules table
CREATE TABLE IF NOT EXISTS modules (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    learning_objectives TEXT NOT NULL,
    hr_id TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'draft',
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (hr_id, title),
    FOREIGN KEY (hr_id) REFERENCES hr_users(id) ON DELETE CASCADE
);

-- Indexes for performance
CREATE INDEX IF NOT EXISTS idx_employees_hr_id ON employees(hr_id);
CREATE INDEX IF NOT EXISTS idx_employees_department ON employees(department);
CREATE INDEX IF NOT EXISTS idx_employees_setup_token ON employees(setup_token);
CREATE INDEX IF NOT EXISTS idx_hr_users_reset_token ON hr_users(reset_token);
CREATE INDEX IF NOT EXISTS idx_modules_hr_id ON modules(hr_id);
CREATE INDEX IF NOT EXISTS idx_modules_status ON modules(status);
CREATE INDEX IF NOT EXISTS idx_modules_hr_id_status ON modules(hr_id, status);
"#;

/// Run all pending database migrations
///
/// Applies schema migrations in order, tracking applied versions in the
/// schema_migrations table.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    info!("Running database migrations");

    // Create migration tracking table
    conn.execute_batch(MIGRATION_TABLE)
        .map_err(LmsError::DatabaseError)?;

    // Check current version
    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(LmsError::DatabaseError)?;

    info!("Current database schema version: {}", current_version);

    // Apply migrations
    if current_version < 1 {
        info!("Applying migration v1: Initial schema");
        apply_migration(conn, 1, MIGRATION_V1)?;
    }

    info!("Database migrations completed successfully");
    Ok(())
}

/// Apply a single migration within a transaction
fn apply_migration(conn: &mut Connection, version: i64, sql: &str) -> Result<()> {
    let tx = conn.transaction().map_err(LmsError::DatabaseError)?;

    tx.execute_batch(sql).map_err(LmsError::DatabaseError)?;
    tx.execute(
        "INSERT INTO schema_migrations (version) VALUES (?)",
        [version],
    )
    .map_err(LmsError::DatabaseError)?;

    tx.commit().map_err(LmsError::DatabaseError)?;
    info!("Migration v{} applied successfully", version);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_create_all_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();

        for table in ["hr_users", "employees", "users", "modules"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "table {} missing", table);
        }
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();

        let version: i64 = conn
            .query_row(
                "SELECT MAX(version) FROM schema_migrations",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_employee_email_unique() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();

        conn.execute(
            "INSERT INTO hr_users (id, name, email, password_hash, role, department, created_at, updated_at) \
             VALUES ('hr-1', 'Alice', 'alice@co.com', 'hash', 'hr', 'Eng', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let insert_bob = "INSERT INTO employees (id, name, email, department, hr_id, created_at, updated_at) \
             VALUES (?1, 'Bob', 'bob@co.com', 'Eng', 'hr-1', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')";
        conn.execute(insert_bob, ["emp-1"]).unwrap();
        assert!(conn.execute(insert_bob, ["emp-2"]).is_err());
    }

    #[test]
    fn test_module_title_unique_per_owner() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();

        for (id, email) in [("hr-1", "a@co.com"), ("hr-2", "b@co.com")] {
            conn.execute(
                "INSERT INTO hr_users (id, name, email, password_hash, role, department, created_at, updated_at) \
                 VALUES (?1, 'HR', ?2, 'hash', 'hr', 'Eng', '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
                [id, email],
            )
            .unwrap();
        }

        let insert = "INSERT INTO modules (id, title, description, learning_objectives, hr_id, created_at, updated_at) \
             VALUES (?1, 'Onboarding', 'desc', '[\"obj\"]', ?2, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')";

        conn.execute(insert, ["mod-1", "hr-1"]).unwrap();
        // Same title under a different owner is fine
        conn.execute(insert, ["mod-2", "hr-2"]).unwrap();
        // Same title under the same owner is not
        assert!(conn.execute(insert, ["mod-3", "hr-1"]).is_err());
    }
}
