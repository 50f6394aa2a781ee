//! Profile handlers with avatar replacement
//!
//! Multipart updates write the new image first, commit the database change,
//! then remove the previous file. If the database write fails after the
//! upload landed on disk, the uploaded file is deleted so no orphan remains.

use crate::api::handlers::AppState;
use crate::auth::handlers::MIN_PASSWORD_LEN;
use crate::auth::middleware::Identity;
use crate::auth::models::{EmployeeUserInfo, HrUserInfo};
use crate::auth::password::{hash_password, verify_password};
use crate::core::error::{LmsError, Result};
use crate::db::repository::Repository;
use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    Json,
};

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// An image file lifted out of a multipart request
struct UploadedImage {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Text fields and optional image of a profile update form
#[derive(Default)]
struct ProfileForm {
    name: Option<String>,
    email: Option<String>,
    department: Option<String>,
    role: Option<String>,
    current_password: Option<String>,
    new_password: Option<String>,
    image: Option<UploadedImage>,
}

async fn parse_profile_form(mut multipart: Multipart) -> Result<ProfileForm> {
    let mut form = ProfileForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| LmsError::ValidationError(format!("Invalid multipart data: {}", e)))?
    {
        let Some(name) = field.name().map(|n| n.to_string()) else {
            continue;
        };

        match name.as_str() {
            "profile_image" | "profileImage" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(|c| c.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| LmsError::ValidationError(format!("Failed to read upload: {}", e)))?;
                form.image = Some(UploadedImage {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| LmsError::ValidationError(format!("Invalid form field: {}", e)))?;
                let value = value.trim().to_string();
                if value.is_empty() {
                    continue;
                }
                match name.as_str() {
                    "name" => form.name = Some(value),
                    "email" => form.email = Some(value.to_lowercase()),
                    "department" => form.department = Some(value),
                    "role" => form.role = Some(value),
                    "current_password" | "currentPassword" => form.current_password = Some(value),
                    "new_password" | "newPassword" => form.new_password = Some(value),
                    _ => {}
                }
            }
        }
    }

    Ok(form)
}

/// Validate and persist an uploaded image, returning its public path
async fn store_image(state: &AppState, image: &UploadedImage) -> Result<String> {
    let extension = state.avatars.validate_upload(
        &image.file_name,
        image.content_type.as_deref(),
        image.bytes.len() as u64,
    )?;
    state.avatars.save(&image.bytes, &extension).await
}

/// Handler for GET /api/hr/profile/:id - Fetch an HR profile
pub async fn hr_get_profile(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let user = state
        .hr_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| LmsError::NotFound("User not found".to_string()))?;

    Ok(Json(serde_json::json!({
        "success": true,
        "user": HrUserInfo::from(user),
    })))
}

/// Handler for PUT /api/hr/profile/:id - Update own profile, avatar included
pub async fn hr_update_profile(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let form = parse_profile_form(multipart).await?;

    // Profiles are self-service only
    if identity.id != id {
        return Err(LmsError::PermissionDenied(
            "Unauthorized to update this profile".to_string(),
        ));
    }

    let mut user = state
        .hr_repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| LmsError::NotFound("User not found".to_string()))?;

    if let Some(email) = &form.email {
        if email != &user.email && state.hr_repo.email_taken_by_other(email, &id).await? {
            return Err(LmsError::Conflict(
                "Email is already in use by another account".to_string(),
            ));
        }
    }

    // The profile route requires the current password before accepting a new
    // one; the dedicated change-password endpoint is the force variant
    if let (Some(current), Some(new)) = (&form.current_password, &form.new_password) {
        if !verify_password(current, &user.password_hash)? {
            return Err(LmsError::ValidationError(
                "Current password is incorrect".to_string(),
            ));
        }
        if new.len() < MIN_PASSWORD_LEN {
            return Err(LmsError::ValidationError(format!(
                "New password must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }
        user.password_hash = hash_password(new)?;
    }

    if let Some(name) = form.name {
        user.name = name;
    }
    if let Some(email) = form.email {
        user.email = email;
    }
    if let Some(department) = form.department {
        user.department = department;
    }
    if let Some(role) = form.role {
        user.role = role;
    }

    let old_avatar = user.avatar.clone();
    let new_avatar = match &form.image {
        Some(image) => Some(store_image(&state, image).await?),
        None => None,
    };
    if let Some(path) = &new_avatar {
        user.avatar = Some(path.clone());
    }
    user.updated_at = now_rfc3339();

    if let Err(e) = state.hr_repo.update(&user).await {
        // The upload landed but the record did not; remove the orphan
        if let Some(path) = &new_avatar {
            let _ = state.avatars.delete(path).await;
        }
        return Err(e);
    }

    if new_avatar.is_some() {
        if let Some(old) = old_avatar {
            let _ = state.avatars.delete(&old).await;
        }
    }

    tracing::info!(user_id = %user.id, "HR profile updated");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Profile updated successfully",
        "user": HrUserInfo::from(user),
    })))
}

/// Handler for GET /api/employee/profile - Current employee profile
pub async fn employee_get_profile(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse> {
    let employee = state
        .employee_repo
        .find_by_id(&identity.id)
        .await?
        .ok_or_else(|| LmsError::NotFound("Employee not found".to_string()))?;

    Ok(Json(serde_json::json!({
        "success": true,
        "user": EmployeeUserInfo::from(employee),
    })))
}

/// Handler for PUT /api/employee/profile - Update own profile, avatar included
pub async fn employee_update_profile(
    State(state): State<AppState>,
    identity: Identity,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let form = parse_profile_form(multipart).await?;

    let (name, email) = match (&form.name, &form.email) {
        (Some(name), Some(email)) => (name.clone(), email.clone()),
        _ => {
            return Err(LmsError::ValidationError(
                "Name and email are required".to_string(),
            ));
        }
    };

    let mut employee = state
        .employee_repo
        .find_by_id(&identity.id)
        .await?
        .ok_or_else(|| LmsError::NotFound("Employee not found".to_string()))?;

    if email != employee.email
        && state
            .employee_repo
            .email_taken_by_other(&email, &employee.id)
            .await?
    {
        return Err(LmsError::Conflict("Email already exists".to_string()));
    }

    employee.name = name;
    employee.email = email;
    if let Some(department) = form.department {
        employee.department = department;
    }

    let old_avatar = employee.avatar.clone();
    let new_avatar = match &form.image {
        Some(image) => Some(store_image(&state, image).await?),
        None => None,
    };
    if let Some(path) = &new_avatar {
        employee.avatar = Some(path.clone());
    }
    employee.updated_at = now_rfc3339();

    if let Err(e) = state.employee_repo.update(&employee).await {
        if let Some(path) = &new_avatar {
            let _ = state.avatars.delete(path).await;
        }
        return Err(e);
    }

    if new_avatar.is_some() {
        if let Some(old) = old_avatar {
            let _ = state.avatars.delete(&old).await;
        }
    }

    tracing::info!(employee_id = %employee.id, "Employee profile updated");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Profile updated successfully",
        "user": EmployeeUserInfo::from(employee),
    })))
}
