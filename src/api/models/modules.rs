//! Learning module API models

use crate::db::models::{Module, ModuleStatus};
use crate::db::repository::ModuleStats;
use serde::{Deserialize, Serialize};

/// Request body for creating a module
#[derive(Debug, Deserialize)]
pub struct CreateModuleRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
    pub status: Option<String>,
}

/// Request body for updating a module
#[derive(Debug, Deserialize)]
pub struct UpdateModuleRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
}

/// Request body for the status transition endpoint
#[derive(Debug, Deserialize)]
pub struct UpdateModuleStatusRequest {
    #[serde(default)]
    pub status: String,
}

/// Module data returned to HR callers (owner id stripped)
#[derive(Debug, Serialize)]
pub struct ModuleResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub learning_objectives: Vec<String>,
    pub status: ModuleStatus,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Module> for ModuleResponse {
    fn from(module: Module) -> Self {
        Self {
            id: module.id,
            title: module.title,
            description: module.description,
            learning_objectives: module.learning_objectives,
            status: module.status,
            is_active: module.is_active,
            created_at: module.created_at,
            updated_at: module.updated_at,
        }
    }
}

/// Response for the module list
#[derive(Debug, Serialize)]
pub struct ModuleListResponse {
    pub success: bool,
    pub message: String,
    pub modules: Vec<ModuleResponse>,
}

/// Response for single-module operations
#[derive(Debug, Serialize)]
pub struct ModuleActionResponse {
    pub success: bool,
    pub message: String,
    pub module: ModuleResponse,
}

/// Module data in the employee-facing listing, with progress placeholders
#[derive(Debug, Serialize)]
pub struct EmployeeModuleResponse {
    #[serde(flatten)]
    pub module: ModuleResponse,
    pub progress: u32,
    pub is_completed: bool,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

impl From<Module> for EmployeeModuleResponse {
    fn from(module: Module) -> Self {
        Self {
            module: ModuleResponse::from(module),
            progress: 0,
            is_completed: false,
            started_at: None,
            completed_at: None,
        }
    }
}

/// Response for the employee-facing published module list
#[derive(Debug, Serialize)]
pub struct EmployeeModuleListResponse {
    pub success: bool,
    pub message: String,
    pub modules: Vec<EmployeeModuleResponse>,
    pub total: usize,
}

/// Aggregated module statistics body
#[derive(Debug, Serialize)]
pub struct ModuleStatsBody {
    pub total_modules: i64,
    pub draft_modules: i64,
    pub published_modules: i64,
    pub archived_modules: i64,
    pub active_modules: i64,
    pub inactive_modules: i64,
    pub recent_modules: i64,
}

impl From<ModuleStats> for ModuleStatsBody {
    fn from(stats: ModuleStats) -> Self {
        Self {
            total_modules: stats.total,
            draft_modules: stats.draft,
            published_modules: stats.published,
            archived_modules: stats.archived,
            active_modules: stats.active,
            inactive_modules: stats.inactive,
            recent_modules: stats.recent,
        }
    }
}

/// Response for the module statistics endpoint
#[derive(Debug, Serialize)]
pub struct ModuleStatsResponse {
    pub success: bool,
    pub message: String,
    pub stats: ModuleStatsBody,
}
