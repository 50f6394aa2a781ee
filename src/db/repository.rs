//! Repository pattern implementation for data access layer
//!
//! This module provides the Repository pattern for abstracting database operations.

use crate::core::error::{LmsError, Result};
use crate::db::manager::DatabaseManager;
use crate::db::models::{Employee, GenericUser, HrUser, Module, ModuleStatus};
use async_trait::async_trait;
use rusqlite::OptionalExtension;
use std::sync::Arc;

/// Generic repository trait for CRUD operations
#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// Find an entity by its ID
    async fn find_by_id(&self, id: &str) -> Result<Option<T>>;

    /// Create a new entity
    async fn create(&self, entity: &T) -> Result<()>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> Result<()>;

    /// Delete an entity by its ID
    async fn delete(&self, id: &str) -> Result<()>;
}

const HR_USER_COLUMNS: &str = "id, name, email, password_hash, role, department, avatar, \
     reset_token, reset_token_expiry, created_at, updated_at";

fn map_hr_user(row: &rusqlite::Row) -> rusqlite::Result<HrUser> {
    Ok(HrUser {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: row.get(4)?,
        department: row.get(5)?,
        avatar: row.get(6)?,
        reset_token: row.get(7)?,
        reset_token_expiry: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Repository for HR user entities
pub struct HrUserRepository {
    db: Arc<DatabaseManager>,
}

impl HrUserRepository {
    /// Create a new HrUserRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find an HR user by normalized email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<HrUser>> {
        let email = email.to_string();
        self.db.execute(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM hr_users WHERE email = ?", HR_USER_COLUMNS),
                [&email],
                map_hr_user,
            ).optional()
            .map_err(LmsError::DatabaseError)
        }).await
    }

    /// Check whether an email belongs to a different HR user
    pub async fn email_taken_by_other(&self, email: &str, exclude_id: &str) -> Result<bool> {
        let email = email.to_string();
        let exclude_id = exclude_id.to_string();
        self.db.execute(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM hr_users WHERE email = ? AND id != ?",
                [&email, &exclude_id],
                |row| row.get(0),
            ).map_err(LmsError::DatabaseError)?;
            Ok(count > 0)
        }).await
    }

    /// Store a password reset token and its expiry on an HR user
    pub async fn set_reset_token(&self, user_id: &str, token: &str, expiry: i64) -> Result<()> {
        let user_id = user_id.to_string();
        let token = token.to_string();
        self.db.execute(move |conn| {
            conn.execute(
                "UPDATE hr_users SET reset_token = ?, reset_token_expiry = ? WHERE id = ?",
                rusqlite::params![&token, expiry, &user_id],
            ).map_err(LmsError::DatabaseError)?;
            Ok(())
        }).await
    }

    /// Find an HR user holding a reset token, regardless of its validity.
    ///
    /// Callers distinguish expired tokens themselves; expired tokens stay in
    /// place for diagnostics.
    pub async fn find_by_reset_token(&self, token: &str) -> Result<Option<HrUser>> {
        let token = token.to_string();
        self.db.execute(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM hr_users WHERE reset_token = ?", HR_USER_COLUMNS),
                [&token],
                map_hr_user,
            ).optional()
            .map_err(LmsError::DatabaseError)
        }).await
    }

    /// Exchange a valid reset token for a new password hash.
    ///
    /// The match, expiry check, password write, and token clear happen in one
    /// statement, so two concurrent submissions cannot both succeed.
    pub async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: i64,
        updated_at: &str,
    ) -> Result<bool> {
        let token = token.to_string();
        let password_hash = password_hash.to_string();
        let updated_at = updated_at.to_string();
        self.db.execute(move |conn| {
            let changed = conn.execute(
                "UPDATE hr_users SET password_hash = ?, reset_token = NULL, \
                 reset_token_expiry = NULL, updated_at = ? \
                 WHERE reset_token = ? AND reset_token_expiry > ?",
                rusqlite::params![&password_hash, &updated_at, &token, now],
            ).map_err(LmsError::DatabaseError)?;
            Ok(changed == 1)
        }).await
    }

    /// Update an HR user's password hash
    pub async fn update_password(&self, user_id: &str, password_hash: &str, updated_at: &str) -> Result<()> {
        let user_id = user_id.to_string();
        let password_hash = password_hash.to_string();
        let updated_at = updated_at.to_string();
        self.db.execute(move |conn| {
            conn.execute(
                "UPDATE hr_users SET password_hash = ?, updated_at = ? WHERE id = ?",
                rusqlite::params![&password_hash, &updated_at, &user_id],
            ).map_err(LmsError::DatabaseError)?;
            Ok(())
        }).await
    }
}

#[async_trait]
impl Repository<HrUser> for HrUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<HrUser>> {
        let id = id.to_string();
        self.db.execute(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM hr_users WHERE id = ?", HR_USER_COLUMNS),
                [&id],
                map_hr_user,
            ).optional()
            .map_err(LmsError::DatabaseError)
        }).await
    }

    async fn create(&self, entity: &HrUser) -> Result<()> {
        let user = entity.clone();
        self.db.execute(move |conn| {
            conn.execute(
                "INSERT INTO hr_users (id, name, email, password_hash, role, department, avatar, \
                 reset_token, reset_token_expiry, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    user.id,
                    user.name,
                    user.email,
                    user.password_hash,
                    user.role,
                    user.department,
                    user.avatar,
                    user.reset_token,
                    user.reset_token_expiry,
                    user.created_at,
                    user.updated_at,
                ],
            ).map_err(LmsError::DatabaseError)?;
            Ok(())
        }).await
    }

    async fn update(&self, entity: &HrUser) -> Result<()> {
        let user = entity.clone();
        self.db.execute(move |conn| {
            conn.execute(
                "UPDATE hr_users SET name = ?2, email = ?3, password_hash = ?4, role = ?5, \
                 department = ?6, avatar = ?7, reset_token = ?8, reset_token_expiry = ?9, \
                 updated_at = ?10 WHERE id = ?1",
                rusqlite::params![
                    user.id,
                    user.name,
                    user.email,
                    user.password_hash,
                    user.role,
                    user.department,
                    user.avatar,
                    user.reset_token,
                    user.reset_token_expiry,
                    user.updated_at,
                ],
            ).map_err(LmsError::DatabaseError)?;
            Ok(())
        }).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.db.execute(move |conn| {
            conn.execute("DELETE FROM hr_users WHERE id = ?", [&id])
                .map_err(LmsError::DatabaseError)?;
            Ok(())
        }).await
    }
}

const EMPLOYEE_COLUMNS: &str = "id, name, email, department, identity_number, phone_number, \
     position, hr_id, password_hash, is_password_set, setup_token, setup_token_expiry, \
     is_active, last_login_at, avatar, created_at, updated_at";

fn map_employee(row: &rusqlite::Row) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        department: row.get(3)?,
        identity_number: row.get(4)?,
        phone_number: row.get(5)?,
        position: row.get(6)?,
        hr_id: row.get(7)?,
        password_hash: row.get(8)?,
        is_password_set: row.get::<_, i64>(9)? != 0,
        setup_token: row.get(10)?,
        setup_token_expiry: row.get(11)?,
        is_active: row.get::<_, i64>(12)? != 0,
        last_login_at: row.get(13)?,
        avatar: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

/// Aggregated employee counts for an HR user's dashboard
#[derive(Debug, Clone, serde::Serialize)]
pub struct EmployeeStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub recent: i64,
    pub departments: Vec<(String, i64)>,
    pub positions: Vec<(String, i64)>,
}

/// Repository for Employee entities
pub struct EmployeeRepository {
    db: Arc<DatabaseManager>,
}

impl EmployeeRepository {
    /// Create a new EmployeeRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find an employee by normalized email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Employee>> {
        let email = email.to_string();
        self.db.execute(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM employees WHERE email = ?", EMPLOYEE_COLUMNS),
                [&email],
                map_employee,
            ).optional()
            .map_err(LmsError::DatabaseError)
        }).await
    }

    /// Check whether an email belongs to a different employee
    pub async fn email_taken_by_other(&self, email: &str, exclude_id: &str) -> Result<bool> {
        let email = email.to_string();
        let exclude_id = exclude_id.to_string();
        self.db.execute(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM employees WHERE email = ? AND id != ?",
                [&email, &exclude_id],
                |row| row.get(0),
            ).map_err(LmsError::DatabaseError)?;
            Ok(count > 0)
        }).await
    }

    /// List all employees created by the given HR user, newest first
    pub async fn find_all_by_hr(&self, hr_id: &str) -> Result<Vec<Employee>> {
        let hr_id = hr_id.to_string();
        self.db.execute(move |conn| {
            let mut stmt = conn.prepare(
                &format!(
                    "SELECT {} FROM employees WHERE hr_id = ? ORDER BY created_at DESC",
                    EMPLOYEE_COLUMNS
                )
            ).map_err(LmsError::DatabaseError)?;

            let employees = stmt.query_map([&hr_id], map_employee)
                .map_err(LmsError::DatabaseError)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(LmsError::DatabaseError)?;

            Ok(employees)
        }).await
    }

    /// Find an employee scoped to its owning HR user.
    ///
    /// Cross-tenant ids come back as None even when the id itself is valid.
    pub async fn find_owned(&self, id: &str, hr_id: &str) -> Result<Option<Employee>> {
        let id = id.to_string();
        let hr_id = hr_id.to_string();
        self.db.execute(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM employees WHERE id = ? AND hr_id = ?", EMPLOYEE_COLUMNS),
                [&id, &hr_id],
                map_employee,
            ).optional()
            .map_err(LmsError::DatabaseError)
        }).await
    }

    /// Delete an employee scoped to its owning HR user
    pub async fn delete_owned(&self, id: &str, hr_id: &str) -> Result<bool> {
        let id = id.to_string();
        let hr_id = hr_id.to_string();
        self.db.execute(move |conn| {
            let changed = conn.execute(
                "DELETE FROM employees WHERE id = ? AND hr_id = ?",
                [&id, &hr_id],
            ).map_err(LmsError::DatabaseError)?;
            Ok(changed == 1)
        }).await
    }

    /// Flip the active flag on an owned employee and return the fresh record.
    ///
    /// Idempotent: setting an already-matching flag succeeds without error.
    /// Passwords and tokens are untouched.
    pub async fn set_active(&self, id: &str, hr_id: &str, active: bool, updated_at: &str) -> Result<Option<Employee>> {
        let id = id.to_string();
        let hr_id = hr_id.to_string();
        let updated_at = updated_at.to_string();
        self.db.execute(move |conn| {
            conn.execute(
                "UPDATE employees SET is_active = ?, updated_at = ? WHERE id = ? AND hr_id = ?",
                rusqlite::params![active as i64, &updated_at, &id, &hr_id],
            ).map_err(LmsError::DatabaseError)?;

            conn.query_row(
                &format!("SELECT {} FROM employees WHERE id = ? AND hr_id = ?", EMPLOYEE_COLUMNS),
                [&id, &hr_id],
                map_employee,
            ).optional()
            .map_err(LmsError::DatabaseError)
        }).await
    }

    /// Record a successful login
    pub async fn update_last_login(&self, id: &str, last_login_at: &str) -> Result<()> {
        let id = id.to_string();
        let last_login_at = last_login_at.to_string();
        self.db.execute(move |conn| {
            conn.execute(
                "UPDATE employees SET last_login_at = ? WHERE id = ?",
                [&last_login_at, &id],
            ).map_err(LmsError::DatabaseError)?;
            Ok(())
        }).await
    }

    /// Find an employee holding a setup token, regardless of its validity.
    ///
    /// Callers distinguish unknown, expired, and already-used tokens; expired
    /// tokens stay in place for diagnostics.
    pub async fn find_by_setup_token(&self, token: &str) -> Result<Option<Employee>> {
        let token = token.to_string();
        self.db.execute(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM employees WHERE setup_token = ?", EMPLOYEE_COLUMNS),
                [&token],
                map_employee,
            ).optional()
            .map_err(LmsError::DatabaseError)
        }).await
    }

    /// Exchange a valid setup token for the first password hash.
    ///
    /// The token match, expiry check, one-time precondition, password write,
    /// and token clear happen in a single statement, so two concurrent
    /// submissions against the same token cannot both succeed.
    pub async fn consume_setup_token(
        &self,
        token: &str,
        password_hash: &str,
        now: i64,
        updated_at: &str,
    ) -> Result<bool> {
        let token = token.to_string();
        let password_hash = password_hash.to_string();
        let updated_at = updated_at.to_string();
        self.db.execute(move |conn| {
            let changed = conn.execute(
                "UPDATE employees SET password_hash = ?, is_password_set = 1, \
                 setup_token = NULL, setup_token_expiry = NULL, updated_at = ? \
                 WHERE setup_token = ? AND setup_token_expiry > ? AND is_password_set = 0",
                rusqlite::params![&password_hash, &updated_at, &token, now],
            ).map_err(LmsError::DatabaseError)?;
            Ok(changed == 1)
        }).await
    }

    /// Update an employee's password hash
    pub async fn update_password(&self, id: &str, password_hash: &str, updated_at: &str) -> Result<()> {
        let id = id.to_string();
        let password_hash = password_hash.to_string();
        let updated_at = updated_at.to_string();
        self.db.execute(move |conn| {
            conn.execute(
                "UPDATE employees SET password_hash = ?, updated_at = ? WHERE id = ?",
                rusqlite::params![&password_hash, &updated_at, &id],
            ).map_err(LmsError::DatabaseError)?;
            Ok(())
        }).await
    }

    /// Aggregate employee counts for the given HR user
    pub async fn stats(&self, hr_id: &str, recent_cutoff: &str) -> Result<EmployeeStats> {
        let hr_id = hr_id.to_string();
        let recent_cutoff = recent_cutoff.to_string();
        self.db.execute(move |conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM employees WHERE hr_id = ?",
                [&hr_id],
                |row| row.get(0),
            ).map_err(LmsError::DatabaseError)?;

            let active: i64 = conn.query_row(
                "SELECT COUNT(*) FROM employees WHERE hr_id = ? AND is_active = 1",
                [&hr_id],
                |row| row.get(0),
            ).map_err(LmsError::DatabaseError)?;

            let recent: i64 = conn.query_row(
                "SELECT COUNT(*) FROM employees WHERE hr_id = ? AND created_at >= ?",
                [&hr_id, &recent_cutoff],
                |row| row.get(0),
            ).map_err(LmsError::DatabaseError)?;

            let mut stmt = conn.prepare(
                "SELECT department, COUNT(*) AS count FROM employees WHERE hr_id = ? \
                 GROUP BY department ORDER BY count DESC"
            ).map_err(LmsError::DatabaseError)?;
            let departments = stmt.query_map([&hr_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            }).map_err(LmsError::DatabaseError)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(LmsError::DatabaseError)?;

            let mut stmt = conn.prepare(
                "SELECT position, COUNT(*) AS count FROM employees \
                 WHERE hr_id = ? AND position IS NOT NULL AND position != '' \
                 GROUP BY position ORDER BY count DESC LIMIT 10"
            ).map_err(LmsError::DatabaseError)?;
            let positions = stmt.query_map([&hr_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            }).map_err(LmsError::DatabaseError)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(LmsError::DatabaseError)?;

            Ok(EmployeeStats {
                total,
                active,
                inactive: total - active,
                recent,
                departments,
                positions,
            })
        }).await
    }
}

#[async_trait]
impl Repository<Employee> for EmployeeRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Employee>> {
        let id = id.to_string();
        self.db.execute(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM employees WHERE id = ?", EMPLOYEE_COLUMNS),
                [&id],
                map_employee,
            ).optional()
            .map_err(LmsError::DatabaseError)
        }).await
    }

    async fn create(&self, entity: &Employee) -> Result<()> {
        let employee = entity.clone();
        self.db.execute(move |conn| {
            conn.execute(
                "INSERT INTO employees (id, name, email, department, identity_number, phone_number, \
                 position, hr_id, password_hash, is_password_set, setup_token, setup_token_expiry, \
                 is_active, last_login_at, avatar, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                rusqlite::params![
                    employee.id,
                    employee.name,
                    employee.email,
                    employee.department,
                    employee.identity_number,
                    employee.phone_number,
                    employee.position,
                    employee.hr_id,
                    employee.password_hash,
                    employee.is_password_set as i64,
                    employee.setup_token,
                    employee.setup_token_expiry,
                    employee.is_active as i64,
                    employee.last_login_at,
                    employee.avatar,
                    employee.created_at,
                    employee.updated_at,
                ],
            ).map_err(LmsError::DatabaseError)?;
            Ok(())
        }).await
    }

    async fn update(&self, entity: &Employee) -> Result<()> {
        let employee = entity.clone();
        self.db.execute(move |conn| {
            conn.execute(
                "UPDATE employees SET name = ?2, email = ?3, department = ?4, identity_number = ?5, \
                 phone_number = ?6, position = ?7, password_hash = ?8, is_password_set = ?9, \
                 setup_token = ?10, setup_token_expiry = ?11, is_active = ?12, last_login_at = ?13, \
                 avatar = ?14, updated_at = ?15 WHERE id = ?1",
                rusqlite::params![
                    employee.id,
                    employee.name,
                    employee.email,
                    employee.department,
                    employee.identity_number,
                    employee.phone_number,
                    employee.position,
                    employee.password_hash,
                    employee.is_password_set as i64,
                    employee.setup_token,
                    employee.setup_token_expiry,
                    employee.is_active as i64,
                    employee.last_login_at,
                    employee.avatar,
                    employee.updated_at,
                ],
            ).map_err(LmsError::DatabaseError)?;
            Ok(())
        }).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.db.execute(move |conn| {
            conn.execute("DELETE FROM employees WHERE id = ?", [&id])
                .map_err(LmsError::DatabaseError)?;
            Ok(())
        }).await
    }
}

const MODULE_COLUMNS: &str = "id, title, description, learning_objectives, hr_id, status, \
     is_active, created_at, updated_at";

fn map_module(row: &rusqlite::Row) -> rusqlite::Result<Module> {
    let objectives_json: String = row.get(3)?;
    let status_str: String = row.get(5)?;
    Ok(Module {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        learning_objectives: serde_json::from_str(&objectives_json).unwrap_or_default(),
        hr_id: row.get(4)?,
        status: ModuleStatus::parse(&status_str).unwrap_or(ModuleStatus::Draft),
        is_active: row.get::<_, i64>(6)? != 0,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Aggregated module counts for an HR user's dashboard
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModuleStats {
    pub total: i64,
    pub draft: i64,
    pub published: i64,
    pub archived: i64,
    pub active: i64,
    pub inactive: i64,
    pub recent: i64,
}

/// Repository for learning module entities
pub struct ModuleRepository {
    db: Arc<DatabaseManager>,
}

impl ModuleRepository {
    /// Create a new ModuleRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// List all modules created by the given HR user, newest first
    pub async fn find_all_by_hr(&self, hr_id: &str) -> Result<Vec<Module>> {
        let hr_id = hr_id.to_string();
        self.db.execute(move |conn| {
            let mut stmt = conn.prepare(
                &format!(
                    "SELECT {} FROM modules WHERE hr_id = ? ORDER BY created_at DESC",
                    MODULE_COLUMNS
                )
            ).map_err(LmsError::DatabaseError)?;

            let modules = stmt.query_map([&hr_id], map_module)
                .map_err(LmsError::DatabaseError)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(LmsError::DatabaseError)?;

            Ok(modules)
        }).await
    }

    /// Find a module scoped to its owning HR user
    pub async fn find_owned(&self, id: &str, hr_id: &str) -> Result<Option<Module>> {
        let id = id.to_string();
        let hr_id = hr_id.to_string();
        self.db.execute(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM modules WHERE id = ? AND hr_id = ?", MODULE_COLUMNS),
                [&id, &hr_id],
                map_module,
            ).optional()
            .map_err(LmsError::DatabaseError)
        }).await
    }

    /// Check whether a title is already used by another module of the same owner
    pub async fn title_taken(&self, hr_id: &str, title: &str, exclude_id: Option<&str>) -> Result<bool> {
        let hr_id = hr_id.to_string();
        let title = title.to_string();
        let exclude_id = exclude_id.map(|s| s.to_string());
        self.db.execute(move |conn| {
            let count: i64 = match &exclude_id {
                Some(id) => conn.query_row(
                    "SELECT COUNT(*) FROM modules WHERE hr_id = ? AND title = ? AND id != ?",
                    [&hr_id, &title, id],
                    |row| row.get(0),
                ),
                None => conn.query_row(
                    "SELECT COUNT(*) FROM modules WHERE hr_id = ? AND title = ?",
                    [&hr_id, &title],
                    |row| row.get(0),
                ),
            }.map_err(LmsError::DatabaseError)?;
            Ok(count > 0)
        }).await
    }

    /// Update the lifecycle status of an owned module
    pub async fn update_status_owned(
        &self,
        id: &str,
        hr_id: &str,
        status: ModuleStatus,
        updated_at: &str,
    ) -> Result<Option<Module>> {
        let id = id.to_string();
        let hr_id = hr_id.to_string();
        let updated_at = updated_at.to_string();
        self.db.execute(move |conn| {
            conn.execute(
                "UPDATE modules SET status = ?, updated_at = ? WHERE id = ? AND hr_id = ?",
                rusqlite::params![status.as_str(), &updated_at, &id, &hr_id],
            ).map_err(LmsError::DatabaseError)?;

            conn.query_row(
                &format!("SELECT {} FROM modules WHERE id = ? AND hr_id = ?", MODULE_COLUMNS),
                [&id, &hr_id],
                map_module,
            ).optional()
            .map_err(LmsError::DatabaseError)
        }).await
    }

    /// Delete a module scoped to its owning HR user. Hard delete.
    pub async fn delete_owned(&self, id: &str, hr_id: &str) -> Result<bool> {
        let id = id.to_string();
        let hr_id = hr_id.to_string();
        self.db.execute(move |conn| {
            let changed = conn.execute(
                "DELETE FROM modules WHERE id = ? AND hr_id = ?",
                [&id, &hr_id],
            ).map_err(LmsError::DatabaseError)?;
            Ok(changed == 1)
        }).await
    }

    /// List modules visible to employees: published and active only
    pub async fn list_published(&self) -> Result<Vec<Module>> {
        self.db.execute(move |conn| {
            let mut stmt = conn.prepare(
                &format!(
                    "SELECT {} FROM modules WHERE status = 'published' AND is_active = 1 \
                     ORDER BY created_at DESC",
                    MODULE_COLUMNS
                )
            ).map_err(LmsError::DatabaseError)?;

            let modules = stmt.query_map([], map_module)
                .map_err(LmsError::DatabaseError)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(LmsError::DatabaseError)?;

            Ok(modules)
        }).await
    }

    /// Aggregate module counts for the given HR user
    pub async fn stats(&self, hr_id: &str, recent_cutoff: &str) -> Result<ModuleStats> {
        let hr_id = hr_id.to_string();
        let recent_cutoff = recent_cutoff.to_string();
        self.db.execute(move |conn| {
            fn count_where(
                conn: &rusqlite::Connection,
                condition: &str,
                params: &[&dyn rusqlite::ToSql],
            ) -> Result<i64> {
                conn.query_row(
                    &format!("SELECT COUNT(*) FROM modules WHERE {}", condition),
                    params,
                    |row| row.get(0),
                ).map_err(LmsError::DatabaseError)
            }

            let total = count_where(conn, "hr_id = ?", &[&hr_id as &dyn rusqlite::ToSql])?;
            let draft = count_where(conn, "hr_id = ? AND status = 'draft'", &[&hr_id as &dyn rusqlite::ToSql])?;
            let published = count_where(conn, "hr_id = ? AND status = 'published'", &[&hr_id as &dyn rusqlite::ToSql])?;
            let archived = count_where(conn, "hr_id = ? AND status = 'archived'", &[&hr_id as &dyn rusqlite::ToSql])?;
            let active = count_where(conn, "hr_id = ? AND is_active = 1", &[&hr_id as &dyn rusqlite::ToSql])?;
            let recent = count_where(conn, "hr_id = ? AND created_at >= ?", &[&hr_id as &dyn rusqlite::ToSql, &recent_cutoff])?;

            Ok(ModuleStats {
                total,
                draft,
                published,
                archived,
                active,
                inactive: total - active,
                recent,
            })
        }).await
    }
}

#[async_trait]
impl Repository<Module> for ModuleRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Module>> {
        let id = id.to_string();
        self.db.execute(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM modules WHERE id = ?", MODULE_COLUMNS),
                [&id],
                map_module,
            ).optional()
            .map_err(LmsError::DatabaseError)
        }).await
    }

    async fn create(&self, entity: &Module) -> Result<()> {
        let module = entity.clone();
        let objectives_json = serde_json::to_string(&module.learning_objectives)
            .map_err(|e| LmsError::Internal(format!("Failed to encode objectives: {}", e)))?;
        self.db.execute(move |conn| {
            conn.execute(
                "INSERT INTO modules (id, title, description, learning_objectives, hr_id, status, \
                 is_active, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                rusqlite::params![
                    module.id,
                    module.title,
                    module.description,
                    objectives_json,
                    module.hr_id,
                    module.status.as_str(),
                    module.is_active as i64,
                    module.created_at,
                    module.updated_at,
                ],
            ).map_err(LmsError::DatabaseError)?;
            Ok(())
        }).await
    }

    async fn update(&self, entity: &Module) -> Result<()> {
        let module = entity.clone();
        let objectives_json = serde_json::to_string(&module.learning_objectives)
            .map_err(|e| LmsError::Internal(format!("Failed to encode objectives: {}", e)))?;
        self.db.execute(move |conn| {
            conn.execute(
                "UPDATE modules SET title = ?2, description = ?3, learning_objectives = ?4, \
                 status = ?5, is_active = ?6, updated_at = ?7 WHERE id = ?1",
                rusqlite::params![
                    module.id,
                    module.title,
                    module.description,
                    objectives_json,
                    module.status.as_str(),
                    module.is_active as i64,
                    module.updated_at,
                ],
            ).map_err(LmsError::DatabaseError)?;
            Ok(())
        }).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.db.execute(move |conn| {
            conn.execute("DELETE FROM modules WHERE id = ?", [&id])
                .map_err(LmsError::DatabaseError)?;
            Ok(())
        }).await
    }
}

fn map_generic_user(row: &rusqlite::Row) -> rusqlite::Result<GenericUser> {
    Ok(GenericUser {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        is_active: row.get::<_, i64>(3)? != 0,
        is_password_set: row.get::<_, i64>(4)? != 0,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Repository for the legacy generic user principal.
///
/// Only the lookups the authorization guard needs; there are no dedicated
/// routes for this principal kind.
pub struct GenericUserRepository {
    db: Arc<DatabaseManager>,
}

impl GenericUserRepository {
    /// Create a new GenericUserRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find a generic user by id
    pub async fn find_by_id(&self, id: &str) -> Result<Option<GenericUser>> {
        let id = id.to_string();
        self.db.execute(move |conn| {
            conn.query_row(
                "SELECT id, email, password_hash, is_active, is_password_set, created_at, updated_at \
                 FROM users WHERE id = ?",
                [&id],
                map_generic_user,
            ).optional()
            .map_err(LmsError::DatabaseError)
        }).await
    }
}
