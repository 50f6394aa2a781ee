//! Database models
//!
//! Data structures representing database tables

use serde::{Deserialize, Serialize};

/// HR user record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HrUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub department: String,
    pub avatar: Option<String>,
    pub reset_token: Option<String>,
    /// Unix seconds; compared inside SQL so consume stays a single statement
    pub reset_token_expiry: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Employee record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub identity_number: Option<String>,
    pub phone_number: Option<String>,
    pub position: Option<String>,
    /// Owning HR user; every employee query is scoped by this
    pub hr_id: String,
    pub password_hash: Option<String>,
    pub is_password_set: bool,
    pub setup_token: Option<String>,
    pub setup_token_expiry: Option<i64>,
    pub is_active: bool,
    pub last_login_at: Option<String>,
    pub avatar: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Legacy generic user record (secondary authentication path)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericUser {
    pub id: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub is_password_set: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Lifecycle status of a learning module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Draft,
    Published,
    Archived,
}

impl ModuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleStatus::Draft => "draft",
            ModuleStatus::Published => "published",
            ModuleStatus::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(ModuleStatus::Draft),
            "published" => Some(ModuleStatus::Published),
            "archived" => Some(ModuleStatus::Archived),
            _ => None,
        }
    }
}

/// Learning module record in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Stored as a JSON array column
    pub learning_objectives: Vec<String>,
    pub hr_id: String,
    pub status: ModuleStatus,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_status_roundtrip() {
        for status in [ModuleStatus::Draft, ModuleStatus::Published, ModuleStatus::Archived] {
            assert_eq!(ModuleStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ModuleStatus::parse("deleted"), None);
    }

    #[test]
    fn test_module_status_serializes_lowercase() {
        let json = serde_json::to_string(&ModuleStatus::Published).unwrap();
        assert_eq!(json, "\"published\"");
    }
}
