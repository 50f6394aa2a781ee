//! Employee management API models

use crate::db::models::Employee;
use crate::db::repository::EmployeeStats;
use serde::{Deserialize, Serialize};

/// Request body for creating an employee
#[derive(Debug, Deserialize)]
pub struct CreateEmployeeRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub department: String,
    pub identity_number: Option<String>,
    pub phone_number: Option<String>,
    pub position: Option<String>,
}

/// Request body for updating an employee
#[derive(Debug, Deserialize)]
pub struct UpdateEmployeeRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub department: String,
    pub identity_number: Option<String>,
    pub phone_number: Option<String>,
    pub position: Option<String>,
}

/// Employee data returned to HR callers (owner id and credentials stripped)
#[derive(Debug, Serialize)]
pub struct EmployeeResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub identity_number: Option<String>,
    pub phone_number: Option<String>,
    pub position: Option<String>,
    pub is_password_set: bool,
    pub is_active: bool,
    /// Derived active/inactive label for frontend compatibility
    pub status: &'static str,
    pub avatar: Option<String>,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Employee> for EmployeeResponse {
    fn from(employee: Employee) -> Self {
        let status = if employee.is_active { "active" } else { "inactive" };
        Self {
            id: employee.id,
            name: employee.name,
            email: employee.email,
            department: employee.department,
            identity_number: employee.identity_number,
            phone_number: employee.phone_number,
            position: employee.position,
            is_password_set: employee.is_password_set,
            is_active: employee.is_active,
            status,
            avatar: employee.avatar,
            last_login_at: employee.last_login_at,
            created_at: employee.created_at,
            updated_at: employee.updated_at,
        }
    }
}

/// Response for the employee list
#[derive(Debug, Serialize)]
pub struct EmployeeListResponse {
    pub success: bool,
    pub message: String,
    pub employees: Vec<EmployeeResponse>,
}

/// Response for single-employee operations
#[derive(Debug, Serialize)]
pub struct EmployeeActionResponse {
    pub success: bool,
    pub message: String,
    pub employee: EmployeeResponse,
}

/// Extra detail on the create response
#[derive(Debug, Serialize)]
pub struct CreateEmployeeDetails {
    pub welcome_email_sent: bool,
}

/// Response for employee creation, including notification outcome
#[derive(Debug, Serialize)]
pub struct CreateEmployeeResponse {
    pub success: bool,
    pub message: String,
    pub employee: EmployeeResponse,
    pub details: CreateEmployeeDetails,
}

/// One department's headcount
#[derive(Debug, Serialize)]
pub struct DepartmentCount {
    pub department: String,
    pub count: i64,
}

/// One position's headcount
#[derive(Debug, Serialize)]
pub struct PositionCount {
    pub position: String,
    pub count: i64,
}

/// Aggregated employee statistics body
#[derive(Debug, Serialize)]
pub struct EmployeeStatsBody {
    pub total_employees: i64,
    pub active_employees: i64,
    pub inactive_employees: i64,
    pub recent_employees: i64,
    pub department_stats: Vec<DepartmentCount>,
    pub position_stats: Vec<PositionCount>,
}

impl From<EmployeeStats> for EmployeeStatsBody {
    fn from(stats: EmployeeStats) -> Self {
        Self {
            total_employees: stats.total,
            active_employees: stats.active,
            inactive_employees: stats.inactive,
            recent_employees: stats.recent,
            department_stats: stats
                .departments
                .into_iter()
                .map(|(department, count)| DepartmentCount { department, count })
                .collect(),
            position_stats: stats
                .positions
                .into_iter()
                .map(|(position, count)| PositionCount { position, count })
                .collect(),
        }
    }
}

/// Response for the employee statistics endpoint
#[derive(Debug, Serialize)]
pub struct EmployeeStatsResponse {
    pub success: bool,
    pub message: String,
    pub stats: EmployeeStatsBody,
}
