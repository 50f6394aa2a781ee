//! Employee management handlers (HR-scoped)
//!
//! Every operation is scoped to the authenticated HR user; storage queries
//! filter on (id, hr_id) so valid ids owned by another HR read as not found.

use crate::api::handlers::AppState;
use crate::api::models::{
    CreateEmployeeDetails, CreateEmployeeRequest, CreateEmployeeResponse, EmployeeActionResponse,
    EmployeeListResponse, EmployeeResponse, EmployeeStatsResponse, UpdateEmployeeRequest,
};
use crate::auth::middleware::Identity;
use crate::auth::setup_token::{generate_token, SETUP_TOKEN_TTL_SECS};
use crate::core::error::{LmsError, Result};
use crate::db::models::Employee;
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

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_employee_fields(name: &str, email: &str, department: &str) -> Result<()> {
    if name.trim().is_empty() || email.trim().is_empty() || department.trim().is_empty() {
        return Err(LmsError::ValidationError(
            "Name, email, and department are required".to_string(),
        ));
    }
    Ok(())
}

/// Handler for GET /api/hr/employees - List the caller's employees
pub async fn list_employees(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse> {
    let employees = state.employee_repo.find_all_by_hr(&identity.id).await?;

    Ok(Json(EmployeeListResponse {
        success: true,
        message: "Employees retrieved successfully".to_string(),
        employees: employees.into_iter().map(EmployeeResponse::from).collect(),
    }))
}

/// Handler for POST /api/hr/employees - Create an employee and email a setup link
pub async fn create_employee(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<CreateEmployeeRequest>,
) -> Result<impl IntoResponse> {
    validate_employee_fields(&req.name, &req.email, &req.department)?;

    // The owning HR record also supplies the company name for the email
    let hr_user = state
        .hr_repo
        .find_by_id(&identity.id)
        .await?
        .ok_or_else(|| LmsError::NotFound("HR user not found".to_string()))?;

    let email = req.email.trim().to_lowercase();
    if state.employee_repo.find_by_email(&email).await?.is_some() {
        return Err(LmsError::Conflict(
            "An employee with this email already exists".to_string(),
        ));
    }

    let setup_token = generate_token();
    let expiry = chrono::Utc::now().timestamp() + SETUP_TOKEN_TTL_SECS;
    let now = now_rfc3339();

    let employee = Employee {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        email,
        department: req.department.trim().to_string(),
        identity_number: normalize_optional(req.identity_number),
        phone_number: normalize_optional(req.phone_number),
        position: normalize_optional(req.position),
        hr_id: identity.id.clone(),
        password_hash: None,
        is_password_set: false,
        setup_token: Some(setup_token.clone()),
        setup_token_expiry: Some(expiry),
        is_active: true,
        last_login_at: None,
        avatar: None,
        created_at: now.clone(),
        updated_at: now,
    };

    state.employee_repo.create(&employee).await?;

    tracing::info!(employee_id = %employee.id, hr_id = %identity.id, "Employee created");

    // Delivery failure never rolls back the created record
    let email_sent = match state
        .mailer
        .send_welcome_email(&employee.email, &employee.name, &hr_user.department, &setup_token)
        .await
    {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(email = %employee.email, error = %e, "Welcome email delivery failed");
            false
        }
    };

    let message = if email_sent {
        "Employee created successfully and welcome email sent"
    } else {
        "Employee created successfully, but welcome email failed to send"
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateEmployeeResponse {
            success: true,
            message: message.to_string(),
            employee: EmployeeResponse::from(employee),
            details: CreateEmployeeDetails {
                welcome_email_sent: email_sent,
            },
        }),
    ))
}

/// Handler for GET /api/hr/employees/:id - Fetch one owned employee
pub async fn get_employee(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let employee = state
        .employee_repo
        .find_owned(&id, &identity.id)
        .await?
        .ok_or_else(|| LmsError::NotFound("Employee not found".to_string()))?;

    Ok(Json(EmployeeActionResponse {
        success: true,
        message: "Employee retrieved successfully".to_string(),
        employee: EmployeeResponse::from(employee),
    }))
}

/// Handler for PUT /api/hr/employees/:id - Update an owned employee
pub async fn update_employee(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<UpdateEmployeeRequest>,
) -> Result<impl IntoResponse> {
    validate_employee_fields(&req.name, &req.email, &req.department)?;

    let mut employee = state
        .employee_repo
        .find_owned(&id, &identity.id)
        .await?
        .ok_or_else(|| LmsError::NotFound("Employee not found".to_string()))?;

    let email = req.email.trim().to_lowercase();
    if email != employee.email
        && state
            .employee_repo
            .email_taken_by_other(&email, &employee.id)
            .await?
    {
        return Err(LmsError::Conflict(
            "An employee with this email already exists".to_string(),
        ));
    }

    employee.name = req.name.trim().to_string();
    employee.email = email;
    employee.department = req.department.trim().to_string();
    employee.identity_number = normalize_optional(req.identity_number);
    employee.phone_number = normalize_optional(req.phone_number);
    employee.position = normalize_optional(req.position);
    employee.updated_at = now_rfc3339();

    state.employee_repo.update(&employee).await?;

    Ok(Json(EmployeeActionResponse {
        success: true,
        message: "Employee updated successfully".to_string(),
        employee: EmployeeResponse::from(employee),
    }))
}

/// Handler for DELETE /api/hr/employees/:id - Hard-delete an owned employee
pub async fn delete_employee(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let deleted = state.employee_repo.delete_owned(&id, &identity.id).await?;
    if !deleted {
        return Err(LmsError::NotFound("Employee not found".to_string()));
    }

    tracing::info!(employee_id = %id, hr_id = %identity.id, "Employee deleted");

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Employee deleted successfully",
    })))
}

/// Handler for PUT /api/hr/employees/:id/deactivate
///
/// Idempotent flag flip; passwords and tokens are untouched, and the
/// employee's data survives for a later reactivate.
pub async fn deactivate_employee(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let employee = state
        .employee_repo
        .set_active(&id, &identity.id, false, &now_rfc3339())
        .await?
        .ok_or_else(|| LmsError::NotFound("Employee not found".to_string()))?;

    tracing::info!(employee_id = %employee.id, "Employee deactivated");

    Ok(Json(EmployeeActionResponse {
        success: true,
        message: "Employee deactivated successfully".to_string(),
        employee: EmployeeResponse::from(employee),
    }))
}

/// Handler for PUT /api/hr/employees/:id/reactivate
pub async fn reactivate_employee(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let employee = state
        .employee_repo
        .set_active(&id, &identity.id, true, &now_rfc3339())
        .await?
        .ok_or_else(|| LmsError::NotFound("Employee not found".to_string()))?;

    tracing::info!(employee_id = %employee.id, "Employee reactivated");

    Ok(Json(EmployeeActionResponse {
        success: true,
        message: "Employee reactivated successfully".to_string(),
        employee: EmployeeResponse::from(employee),
    }))
}

/// Handler for GET /api/hr/employees/stats - Dashboard counts
pub async fn employee_stats(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse> {
    let cutoff = (chrono::Utc::now() - chrono::Duration::days(30)).to_rfc3339();
    let stats = state.employee_repo.stats(&identity.id, &cutoff).await?;

    Ok(Json(EmployeeStatsResponse {
        success: true,
        message: "Employee statistics retrieved successfully".to_string(),
        stats: stats.into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::PrincipalType;
    use crate::auth::middleware::Identity;
    use crate::core::config::EmailConfig;
    use crate::core::storage::AvatarStore;
    use crate::db::manager::DatabaseManager;
    use crate::db::models::HrUser;
    use crate::db::repository::{
        EmployeeRepository, GenericUserRepository, HrUserRepository, ModuleRepository,
    };
    use crate::mailer::Mailer;
    use axum::response::IntoResponse;
    use std::sync::Arc;

    fn test_state(temp_dir: &tempfile::TempDir) -> AppState {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        let mailer = Mailer::new(&EmailConfig {
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_user: String::new(),
            smtp_pass: String::new(),
            from_name: "Learning Management System".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
        })
        .unwrap();

        AppState {
            hr_repo: Arc::new(HrUserRepository::new(db.clone())),
            employee_repo: Arc::new(EmployeeRepository::new(db.clone())),
            module_repo: Arc::new(ModuleRepository::new(db.clone())),
            user_repo: Arc::new(GenericUserRepository::new(db)),
            mailer: Arc::new(mailer),
            avatars: Arc::new(AvatarStore::new(
                temp_dir.path().to_path_buf(),
                "/uploads/profiles".to_string(),
                5 * 1024 * 1024,
            )),
            jwt_secret: Arc::new("test-secret".to_string()),
        }
    }

    async fn seed_hr(state: &AppState, id: &str, email: &str) -> Identity {
        let now = now_rfc3339();
        state
            .hr_repo
            .create(&HrUser {
                id: id.to_string(),
                name: "Alice".to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
                role: "hr".to_string(),
                department: "Eng".to_string(),
                avatar: None,
                reset_token: None,
                reset_token_expiry: None,
                created_at: now.clone(),
                updated_at: now,
            })
            .await
            .unwrap();

        Identity {
            id: id.to_string(),
            email: email.to_string(),
            principal: PrincipalType::Hr,
            role: Some("hr".to_string()),
        }
    }

    async fn response_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_employee_reports_undelivered_email() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let hr = seed_hr(&state, "hr-1", "alice@co.com").await;

        let response = create_employee(
            State(state.clone()),
            hr,
            Json(CreateEmployeeRequest {
                name: "Bob".to_string(),
                email: "Bob@Co.com".to_string(),
                department: "Eng".to_string(),
                identity_number: None,
                phone_number: Some("  555-0100 ".to_string()),
                position: Some(String::new()),
            }),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        // The mailer is unconfigured: the record is created, the notification
        // outcome is reported as a partial success
        let body = response_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["details"]["welcome_email_sent"], false);
        assert!(body["message"].as_str().unwrap().contains("failed to send"));
        assert_eq!(body["employee"]["email"], "bob@co.com");
        assert_eq!(body["employee"]["phone_number"], "555-0100");
        assert_eq!(body["employee"]["position"], serde_json::Value::Null);
        assert_eq!(body["employee"]["status"], "active");
        assert_eq!(body["employee"]["is_password_set"], false);

        // A pending setup token with a future expiry is on the record
        let created = state
            .employee_repo
            .find_by_email("bob@co.com")
            .await
            .unwrap()
            .unwrap();
        assert!(created.setup_token.is_some());
        assert!(created.setup_token_expiry.unwrap() > chrono::Utc::now().timestamp());
    }

    #[tokio::test]
    async fn test_deactivate_twice_succeeds_both_times() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let hr = seed_hr(&state, "hr-1", "alice@co.com").await;

        let response = create_employee(
            State(state.clone()),
            hr.clone(),
            Json(CreateEmployeeRequest {
                name: "Bob".to_string(),
                email: "bob@co.com".to_string(),
                department: "Eng".to_string(),
                identity_number: None,
                phone_number: None,
                position: None,
            }),
        )
        .await
        .unwrap()
        .into_response();
        let body = response_json(response).await;
        let employee_id = body["employee"]["id"].as_str().unwrap().to_string();

        for _ in 0..2 {
            let response = deactivate_employee(
                State(state.clone()),
                hr.clone(),
                Path(employee_id.clone()),
            )
            .await
            .unwrap()
            .into_response();
            assert_eq!(response.status(), StatusCode::OK);

            let body = response_json(response).await;
            assert_eq!(body["employee"]["is_active"], false);
            assert_eq!(body["employee"]["status"], "inactive");
        }

        // Reactivation flips it back
        let response = reactivate_employee(State(state.clone()), hr, Path(employee_id))
            .await
            .unwrap()
            .into_response();
        let body = response_json(response).await;
        assert_eq!(body["employee"]["status"], "active");
    }

    #[tokio::test]
    async fn test_cross_tenant_employee_access_rejected() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let owner = seed_hr(&state, "hr-1", "alice@co.com").await;
        let other = seed_hr(&state, "hr-2", "eve@co.com").await;

        let response = create_employee(
            State(state.clone()),
            owner,
            Json(CreateEmployeeRequest {
                name: "Bob".to_string(),
                email: "bob@co.com".to_string(),
                department: "Eng".to_string(),
                identity_number: None,
                phone_number: None,
                position: None,
            }),
        )
        .await
        .unwrap()
        .into_response();
        let body = response_json(response).await;
        let employee_id = body["employee"]["id"].as_str().unwrap().to_string();

        let result = get_employee(State(state.clone()), other.clone(), Path(employee_id.clone())).await;
        assert!(matches!(result, Err(LmsError::NotFound(_))));

        let result =
            deactivate_employee(State(state.clone()), other.clone(), Path(employee_id.clone())).await;
        assert!(matches!(result, Err(LmsError::NotFound(_))));

        let result = delete_employee(State(state.clone()), other, Path(employee_id)).await;
        assert!(matches!(result, Err(LmsError::NotFound(_))));
    }
}
