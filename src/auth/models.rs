//! Authentication request/response models

use crate::db::models::{Employee, HrUser};
use serde::{Deserialize, Serialize};

/// HR registration request
#[derive(Debug, Deserialize)]
pub struct HrRegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub department: String,
    pub role: Option<String>,
    #[serde(default)]
    pub password: String,
}

/// Login request, shared by the HR and employee flows
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Forgot-password request
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

/// Reset-password request (token exchange)
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub password: String,
}

/// Employee set-password request (setup token exchange)
#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Authenticated change-password request
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub new_password: String,
}

/// HR user info (without credentials or token fields)
#[derive(Debug, Serialize)]
pub struct HrUserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub role: String,
    pub avatar: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl From<HrUser> for HrUserInfo {
    fn from(user: HrUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            department: user.department,
            role: user.role,
            avatar: user.avatar,
            kind: "hr",
        }
    }
}

/// Employee info for the login/profile responses
#[derive(Debug, Serialize)]
pub struct EmployeeUserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub position: Option<String>,
    pub phone_number: Option<String>,
    pub identity_number: Option<String>,
    pub avatar: Option<String>,
    pub last_login_at: Option<String>,
    pub is_active: bool,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl From<Employee> for EmployeeUserInfo {
    fn from(employee: Employee) -> Self {
        Self {
            id: employee.id,
            name: employee.name,
            email: employee.email,
            department: employee.department,
            position: employee.position,
            phone_number: employee.phone_number,
            identity_number: employee.identity_number,
            avatar: employee.avatar,
            last_login_at: employee.last_login_at,
            is_active: employee.is_active,
            kind: "employee",
        }
    }
}

/// HR login/register response
#[derive(Debug, Serialize)]
pub struct HrAuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: HrUserInfo,
}

/// Employee login response
#[derive(Debug, Serialize)]
pub struct EmployeeAuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: EmployeeUserInfo,
}

/// Setup-token verification response payload
#[derive(Debug, Serialize)]
pub struct SetupTokenPreview {
    pub name: String,
    pub email: String,
    pub department: String,
}

/// Setup-token verification response
#[derive(Debug, Serialize)]
pub struct VerifySetupTokenResponse {
    pub success: bool,
    pub message: String,
    pub employee: SetupTokenPreview,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
