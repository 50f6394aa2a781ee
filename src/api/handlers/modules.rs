//! Learning module handlers
//!
//! HR endpoints are scoped to the owning HR user. The employee-facing
//! listing exposes only published, active modules and never the owner id.

use crate::api::handlers::AppState;
use crate::api::models::{
    CreateModuleRequest, EmployeeModuleListResponse, EmployeeModuleResponse, ModuleActionResponse,
    ModuleListResponse, ModuleResponse, ModuleStatsResponse, UpdateModuleRequest,
    UpdateModuleStatusRequest,
};
use crate::auth::middleware::Identity;
use crate::core::error::{LmsError, Result};
use crate::db::models::{Module, ModuleStatus};
use crate::db::repository::Repository;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Trim objectives, drop blanks, and require at least one to survive.
fn clean_objectives(objectives: Vec<String>) -> Result<Vec<String>> {
    let cleaned: Vec<String> = objectives
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();

    if cleaned.is_empty() {
        return Err(LmsError::ValidationError(
            "At least one valid learning objective is required".to_string(),
        ));
    }

    Ok(cleaned)
}

fn parse_status(status: &str) -> Result<ModuleStatus> {
    ModuleStatus::parse(status).ok_or_else(|| {
        LmsError::ValidationError(
            "Invalid status. Must be draft, published, or archived".to_string(),
        )
    })
}

/// Handler for GET /api/hr/modules - List the caller's modules
pub async fn list_modules(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse> {
    let modules = state.module_repo.find_all_by_hr(&identity.id).await?;

    Ok(Json(ModuleListResponse {
        success: true,
        message: "Modules retrieved successfully".to_string(),
        modules: modules.into_iter().map(ModuleResponse::from).collect(),
    }))
}

/// Handler for POST /api/hr/modules - Create a module
pub async fn create_module(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<CreateModuleRequest>,
) -> Result<impl IntoResponse> {
    if req.title.trim().is_empty() || req.description.trim().is_empty() {
        return Err(LmsError::ValidationError(
            "Title, description, and learning objectives are required".to_string(),
        ));
    }

    let objectives = clean_objectives(req.learning_objectives)?;

    let status = match req.status.as_deref() {
        Some(status) => parse_status(status)?,
        None => ModuleStatus::Draft,
    };

    let title = req.title.trim().to_string();
    if state
        .module_repo
        .title_taken(&identity.id, &title, None)
        .await?
    {
        return Err(LmsError::Conflict(
            "A module with this title already exists".to_string(),
        ));
    }

    let now = now_rfc3339();
    let module = Module {
        id: Uuid::new_v4().to_string(),
        title,
        description: req.description.trim().to_string(),
        learning_objectives: objectives,
        hr_id: identity.id.clone(),
        status,
        is_active: true,
        created_at: now.clone(),
        updated_at: now,
    };

    state.module_repo.create(&module).await?;

    tracing::info!(module_id = %module.id, hr_id = %identity.id, "Module created");

    Ok((
        StatusCode::CREATED,
        Json(ModuleActionResponse {
            success: true,
            message: "Module created successfully".to_string(),
            module: ModuleResponse::from(module),
        }),
    ))
}

/// Handler for GET /api/hr/modules/:id - Fetch one owned module
pub async fn get_module(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let module = state
        .module_repo
        .find_owned(&id, &identity.id)
        .await?
        .ok_or_else(|| LmsError::NotFound("Module not found".to_string()))?;

    Ok(Json(ModuleActionResponse {
        success: true,
        message: "Module retrieved successfully".to_string(),
        module: ModuleResponse::from(module),
    }))
}

/// Handler for PUT /api/hr/modules/:id - Update an owned module
pub async fn update_module(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<UpdateModuleRequest>,
) -> Result<impl IntoResponse> {
    if req.title.trim().is_empty() || req.description.trim().is_empty() {
        return Err(LmsError::ValidationError(
            "Title, description, and learning objectives are required".to_string(),
        ));
    }

    let objectives = clean_objectives(req.learning_objectives)?;

    let mut module = state
        .module_repo
        .find_owned(&id, &identity.id)
        .await?
        .ok_or_else(|| LmsError::NotFound("Module not found".to_string()))?;

    let title = req.title.trim().to_string();
    if title != module.title
        && state
            .module_repo
            .title_taken(&identity.id, &title, Some(&module.id))
            .await?
    {
        return Err(LmsError::Conflict(
            "A module with this title already exists".to_string(),
        ));
    }

    module.title = title;
    module.description = req.description.trim().to_string();
    module.learning_objectives = objectives;
    module.updated_at = now_rfc3339();

    state.module_repo.update(&module).await?;

    Ok(Json(ModuleActionResponse {
        success: true,
        message: "Module updated successfully".to_string(),
        module: ModuleResponse::from(module),
    }))
}

/// Handler for PATCH /api/hr/modules/:id/status - Lifecycle transition
///
/// Transitions are free among draft, published, and archived.
pub async fn update_module_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<UpdateModuleStatusRequest>,
) -> Result<impl IntoResponse> {
    let status = parse_status(&req.status)?;

    let module = state
        .module_repo
        .update_status_owned(&id, &identity.id, status, &now_rfc3339())
        .await?
        .ok_or_else(|| LmsError::NotFound("Module not found".to_string()))?;

    let message = match status {
        ModuleStatus::Published => "Module published successfully",
        ModuleStatus::Archived => "Module archived successfully",
        ModuleStatus::Draft => "Module saved as draft successfully",
    };

    tracing::info!(module_id = %module.id, status = %status.as_str(), "Module status updated");

    Ok(Json(ModuleActionResponse {
        success: true,
        message: message.to_string(),
        module: ModuleResponse::from(module),
    }))
}

/// Handler for DELETE /api/hr/modules/:id - Hard-delete an owned module
pub async fn delete_module(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let deleted = state.module_repo.delete_owned(&id, &identity.id).await?;
    if !deleted {
        return Err(LmsError::NotFound("Module not found".to_string()));
    }

    tracing::info!(module_id = %id, hr_id = %identity.id, "Module deleted");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Module deleted successfully",
    })))
}

/// Handler for GET /api/hr/modules/stats - Dashboard counts
pub async fn module_stats(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse> {
    let cutoff = (chrono::Utc::now() - chrono::Duration::days(30)).to_rfc3339();
    let stats = state.module_repo.stats(&identity.id, &cutoff).await?;

    Ok(Json(ModuleStatsResponse {
        success: true,
        message: "Module statistics retrieved successfully".to_string(),
        stats: stats.into(),
    }))
}

/// Handler for GET /api/modules - Published modules visible to employees
pub async fn list_published_modules(
    State(state): State<AppState>,
    _identity: Identity,
) -> Result<impl IntoResponse> {
    let modules = state.module_repo.list_published().await?;
    let total = modules.len();

    Ok(Json(EmployeeModuleListResponse {
        success: true,
        message: "Published modules retrieved successfully".to_string(),
        modules: modules
            .into_iter()
            .map(EmployeeModuleResponse::from)
            .collect(),
        total,
    }))
}
