//! Authentication and credential lifecycle handlers

use crate::api::handlers::AppState;
use crate::auth::jwt::{issue_token, PrincipalType};
use crate::auth::middleware::Identity;
use crate::auth::models::{
    ChangePasswordRequest, EmployeeAuthResponse, EmployeeUserInfo, ForgotPasswordRequest,
    HrAuthResponse, HrRegisterRequest, HrUserInfo, LoginRequest, MessageResponse,
    ResetPasswordRequest, SetPasswordRequest, SetupTokenPreview, VerifySetupTokenResponse,
};
use crate::auth::password::{hash_password, verify_password, PHANTOM_HASH};
use crate::auth::setup_token::{classify, generate_token, TokenState, RESET_TOKEN_TTL_SECS};
use crate::core::error::{LmsError, Result};
use crate::db::models::HrUser;
use crate::db::repository::Repository;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

/// Minimum accepted password length, every flow.
///
/// The HR reset path historically accepted 6; standardized on 8 (see DESIGN.md).
pub const MIN_PASSWORD_LEN: usize = 8;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn check_password_length(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(LmsError::ValidationError(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Handler for POST /api/hr/register - HR registration with auto-login
pub async fn hr_register(
    State(state): State<AppState>,
    Json(req): Json<HrRegisterRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!(email = %req.email, "HR registration attempt");

    let mut missing = Vec::new();
    if req.name.trim().is_empty() {
        missing.push("name is required".to_string());
    }
    if req.email.trim().is_empty() {
        missing.push("email is required".to_string());
    }
    if req.department.trim().is_empty() {
        missing.push("department is required".to_string());
    }
    if req.password.is_empty() {
        missing.push("password is required".to_string());
    }
    if !missing.is_empty() {
        return Err(LmsError::ValidationErrors(missing));
    }
    check_password_length(&req.password)?;

    let email = normalize_email(&req.email);
    if state.hr_repo.find_by_email(&email).await?.is_some() {
        return Err(LmsError::Conflict("Email already exists".to_string()));
    }

    let password_hash = hash_password(&req.password)?;
    let now = now_rfc3339();

    let user = HrUser {
        id: Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        email: email.clone(),
        password_hash,
        role: req.role.unwrap_or_else(|| "hr".to_string()),
        department: req.department.trim().to_string(),
        avatar: None,
        reset_token: None,
        reset_token_expiry: None,
        created_at: now.clone(),
        updated_at: now,
    };

    state.hr_repo.create(&user).await?;

    // Auto-login after registration
    let token = issue_token(
        &user.id,
        &user.email,
        PrincipalType::Hr,
        Some(&user.role),
        &state.jwt_secret,
    )?;

    tracing::info!(user_id = %user.id, email = %user.email, "HR user registered successfully");

    Ok((
        StatusCode::CREATED,
        Json(HrAuthResponse {
            success: true,
            message: "HR user registered successfully".to_string(),
            token,
            user: HrUserInfo::from(user),
        }),
    ))
}

/// Handler for POST /api/hr/login - HR login
pub async fn hr_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!(email = %req.email, "HR login attempt");

    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(LmsError::ValidationError(
            "Email and password are required".to_string(),
        ));
    }

    let email = normalize_email(&req.email);
    let user = state.hr_repo.find_by_email(&email).await?;

    // One uniform rejection for unknown email and wrong password, with a
    // phantom comparison so both branches cost the same
    let user = match user {
        Some(user) => user,
        None => {
            let _ = verify_password(&req.password, PHANTOM_HASH);
            return Err(LmsError::ValidationError(
                "Invalid email or password".to_string(),
            ));
        }
    };

    if !verify_password(&req.password, &user.password_hash)? {
        tracing::warn!(email = %email, "Invalid HR password");
        return Err(LmsError::ValidationError(
            "Invalid email or password".to_string(),
        ));
    }

    let token = issue_token(
        &user.id,
        &user.email,
        PrincipalType::Hr,
        Some(&user.role),
        &state.jwt_secret,
    )?;

    tracing::info!(user_id = %user.id, "HR login successful");

    Ok(Json(HrAuthResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        user: HrUserInfo::from(user),
    }))
}

/// Handler for GET /api/hr/profile - Current HR profile
pub async fn hr_current_profile(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse> {
    let user = state
        .hr_repo
        .find_by_id(&identity.id)
        .await?
        .ok_or_else(|| LmsError::NotFound("User not found".to_string()))?;

    Ok(Json(serde_json::json!({
        "success": true,
        "user": HrUserInfo::from(user),
    })))
}

/// Handler for POST /api/hr/forgot-password - Issue a reset token
///
/// Tells the caller whether the email is registered. Inherited product
/// choice; flagged as an enumeration tradeoff in DESIGN.md.
pub async fn hr_forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse> {
    if req.email.trim().is_empty() {
        return Err(LmsError::ValidationError("Email is required".to_string()));
    }

    let email = normalize_email(&req.email);
    let user = state.hr_repo.find_by_email(&email).await?.ok_or_else(|| {
        LmsError::ValidationError(
            "The email you entered is not registered. Please check your email and try again."
                .to_string(),
        )
    })?;

    let reset_token = generate_token();
    let expiry = chrono::Utc::now().timestamp() + RESET_TOKEN_TTL_SECS;
    state
        .hr_repo
        .set_reset_token(&user.id, &reset_token, expiry)
        .await?;

    // Best-effort delivery; the stored token is not rolled back on failure
    let message = match state.mailer.send_reset_email(&user.email, &reset_token).await {
        Ok(()) => "Password reset link sent to your email".to_string(),
        Err(e) => {
            tracing::warn!(email = %user.email, error = %e, "Reset email delivery failed");
            "Password reset link generated, but the notification email failed to send".to_string()
        }
    };

    Ok(Json(MessageResponse::ok(message)))
}

/// Handler for POST /api/hr/reset-password - Exchange a reset token
pub async fn hr_reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse> {
    if req.token.is_empty() || req.password.is_empty() {
        return Err(LmsError::ValidationError(
            "Token and password are required".to_string(),
        ));
    }
    check_password_length(&req.password)?;

    let now = chrono::Utc::now().timestamp();

    // Distinguish unknown from expired for support diagnosis; a reset token
    // has no one-time precondition beyond being cleared on use
    let user = state
        .hr_repo
        .find_by_reset_token(&req.token)
        .await?
        .ok_or_else(|| LmsError::ValidationError("Invalid password reset link".to_string()))?;

    if classify(false, user.reset_token_expiry, now) == TokenState::Expired {
        return Err(LmsError::ValidationError(
            "Password reset link has expired".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let consumed = state
        .hr_repo
        .consume_reset_token(&req.token, &password_hash, now, &now_rfc3339())
        .await?;

    // A concurrent exchange can win between the lookup and the consume
    if !consumed {
        return Err(LmsError::ValidationError(
            "Invalid or expired reset token".to_string(),
        ));
    }

    tracing::info!(user_id = %user.id, "HR password reset successful");

    Ok(Json(MessageResponse::ok("Password reset successful")))
}

/// Handler for POST /api/hr/change-password - Authenticated force change
///
/// Deliberately skips current-password verification; this backs the
/// first-login flow. The profile update route is the verifying variant.
pub async fn hr_change_password(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse> {
    if req.new_password.is_empty() {
        return Err(LmsError::ValidationError(
            "New password is required".to_string(),
        ));
    }
    check_password_length(&req.new_password)?;

    state
        .hr_repo
        .find_by_id(&identity.id)
        .await?
        .ok_or_else(|| LmsError::NotFound("User not found".to_string()))?;

    let password_hash = hash_password(&req.new_password)?;
    state
        .hr_repo
        .update_password(&identity.id, &password_hash, &now_rfc3339())
        .await?;

    tracing::info!(user_id = %identity.id, "HR password changed");

    Ok(Json(MessageResponse::ok("Password changed successfully")))
}

/// Handler for POST /api/employee/login - Employee login
pub async fn employee_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!(email = %req.email, "Employee login attempt");

    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(LmsError::ValidationError(
            "Email and password are required".to_string(),
        ));
    }

    let email = normalize_email(&req.email);
    let employee = match state.employee_repo.find_by_email(&email).await? {
        Some(employee) => employee,
        None => {
            let _ = verify_password(&req.password, PHANTOM_HASH);
            return Err(LmsError::ValidationError(
                "Invalid email or password".to_string(),
            ));
        }
    };

    // Deactivation is reported distinctly from bad credentials
    if !employee.is_active {
        return Err(LmsError::PermissionDenied(
            "Your account has been deactivated. Please contact HR for assistance.".to_string(),
        ));
    }

    // An account that never finished onboarding gets a setup-specific message
    let password_hash = match (&employee.password_hash, employee.is_password_set) {
        (Some(hash), true) => hash.clone(),
        _ => {
            let _ = verify_password(&req.password, PHANTOM_HASH);
            return Err(LmsError::ValidationError(
                "Password not set. Please check your email for setup instructions.".to_string(),
            ));
        }
    };

    if !verify_password(&req.password, &password_hash)? {
        tracing::warn!(email = %email, "Invalid employee password");
        return Err(LmsError::ValidationError(
            "Invalid email or password".to_string(),
        ));
    }

    let last_login_at = now_rfc3339();
    state
        .employee_repo
        .update_last_login(&employee.id, &last_login_at)
        .await?;

    let token = issue_token(
        &employee.id,
        &employee.email,
        PrincipalType::Employee,
        None,
        &state.jwt_secret,
    )?;

    tracing::info!(employee_id = %employee.id, "Employee login successful");

    let mut user = EmployeeUserInfo::from(employee);
    user.last_login_at = Some(last_login_at);

    Ok(Json(EmployeeAuthResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        user,
    }))
}

/// Handler for GET /api/employee/verify-password-token/:token
///
/// Previews the pending account behind a setup link. Unknown, expired, and
/// already-used tokens fail with three distinct messages.
pub async fn verify_setup_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse> {
    if token.is_empty() {
        return Err(LmsError::ValidationError("Token is required".to_string()));
    }

    let employee = state
        .employee_repo
        .find_by_setup_token(&token)
        .await?
        .ok_or_else(|| LmsError::ValidationError("Invalid password setup link".to_string()))?;

    let now = chrono::Utc::now().timestamp();
    match classify(employee.is_password_set, employee.setup_token_expiry, now) {
        TokenState::Valid => {}
        TokenState::Consumed => {
            return Err(LmsError::ValidationError(
                "This setup link has already been used".to_string(),
            ));
        }
        TokenState::Expired => {
            return Err(LmsError::ValidationError(
                "Password setup link has expired. Please contact HR for a new one.".to_string(),
            ));
        }
    }

    Ok(Json(VerifySetupTokenResponse {
        success: true,
        message: "Token is valid".to_string(),
        employee: SetupTokenPreview {
            name: employee.name,
            email: employee.email,
            department: employee.department,
        },
    }))
}

/// Handler for POST /api/employee/set-password - Consume a setup token
pub async fn employee_set_password(
    State(state): State<AppState>,
    Json(req): Json<SetPasswordRequest>,
) -> Result<impl IntoResponse> {
    if req.token.is_empty() || req.password.is_empty() || req.confirm_password.is_empty() {
        return Err(LmsError::ValidationError(
            "Token, password, and confirm password are required".to_string(),
        ));
    }

    if req.password != req.confirm_password {
        return Err(LmsError::ValidationError(
            "Passwords do not match".to_string(),
        ));
    }
    check_password_length(&req.password)?;

    let employee = state
        .employee_repo
        .find_by_setup_token(&req.token)
        .await?
        .ok_or_else(|| LmsError::ValidationError("Invalid password setup link".to_string()))?;

    let now = chrono::Utc::now().timestamp();
    match classify(employee.is_password_set, employee.setup_token_expiry, now) {
        TokenState::Valid => {}
        TokenState::Consumed => {
            return Err(LmsError::ValidationError(
                "This setup link has already been used".to_string(),
            ));
        }
        TokenState::Expired => {
            return Err(LmsError::ValidationError(
                "Password setup link has expired. Please contact HR for a new one.".to_string(),
            ));
        }
    }

    let password_hash = hash_password(&req.password)?;

    // Single-statement exchange: two racing submissions cannot both win
    let consumed = state
        .employee_repo
        .consume_setup_token(&req.token, &password_hash, now, &now_rfc3339())
        .await?;

    if !consumed {
        return Err(LmsError::ValidationError(
            "Invalid or expired password setup link".to_string(),
        ));
    }

    tracing::info!(employee_id = %employee.id, "Employee password set");

    Ok(Json(MessageResponse::ok(
        "Password set successfully! You can now login to the system.",
    )))
}

/// Handler for POST /api/employee/change-password - Authenticated change
pub async fn employee_change_password(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse> {
    if req.new_password.is_empty() {
        return Err(LmsError::ValidationError(
            "New password is required".to_string(),
        ));
    }
    check_password_length(&req.new_password)?;

    let employee = state
        .employee_repo
        .find_by_id(&identity.id)
        .await?
        .ok_or_else(|| LmsError::NotFound("Employee not found".to_string()))?;

    // The new password must actually change the credential
    if let Some(current_hash) = &employee.password_hash {
        if verify_password(&req.new_password, current_hash)? {
            return Err(LmsError::ValidationError(
                "New password must be different from current password".to_string(),
            ));
        }
    }

    let password_hash = hash_password(&req.new_password)?;
    state
        .employee_repo
        .update_password(&employee.id, &password_hash, &now_rfc3339())
        .await?;

    tracing::info!(employee_id = %employee.id, "Employee password changed");

    Ok(Json(MessageResponse::ok("Password changed successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::verify_token;
    use crate::core::config::EmailConfig;
    use crate::core::storage::AvatarStore;
    use crate::db::manager::DatabaseManager;
    use crate::db::repository::{
        EmployeeRepository, GenericUserRepository, HrUserRepository, ModuleRepository,
    };
    use crate::mailer::Mailer;
    use axum::response::IntoResponse;
    use std::sync::Arc;

    const SECRET: &str = "test-secret";

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
            jwt_secret: Arc::new(SECRET.to_string()),
        }
    }

    async fn response_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register_alice(state: &AppState) -> serde_json::Value {
        let response = hr_register(
            State(state.clone()),
            Json(HrRegisterRequest {
                name: "Alice".to_string(),
                email: "alice@co.com".to_string(),
                department: "Eng".to_string(),
                role: None,
                password: "secret123".to_string(),
            }),
        )
        .await
        .unwrap()
        .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        response_json(response).await
    }

    #[tokio::test]
    async fn test_register_then_login_yields_hr_token() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let state = test_state(&temp_dir);

        let registered = register_alice(&state).await;
        assert_eq!(registered["user"]["type"], "hr");

        let response = hr_login(
            State(state.clone()),
            Json(LoginRequest {
                email: "Alice@Co.com ".to_string(), // normalized on lookup
                password: "secret123".to_string(),
            }),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        let claims = verify_token(body["token"].as_str().unwrap(), SECRET).unwrap();
        assert_eq!(claims.principal, PrincipalType::Hr);
        assert_eq!(claims.email, "alice@co.com");
    }

    #[tokio::test]
    async fn test_login_rejections_are_uniform() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        register_alice(&state).await;

        let unknown = hr_login(
            State(state.clone()),
            Json(LoginRequest {
                email: "nobody@co.com".to_string(),
                password: "secret123".to_string(),
            }),
        )
        .await;
        let wrong = hr_login(
            State(state.clone()),
            Json(LoginRequest {
                email: "alice@co.com".to_string(),
                password: "wrong-password".to_string(),
            }),
        )
        .await;

        // Unknown email and wrong password are indistinguishable
        match (unknown, wrong) {
            (Err(LmsError::ValidationError(a)), Err(LmsError::ValidationError(b))) => {
                assert_eq!(a, b);
            }
            _ => panic!("expected uniform validation rejections"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_hr_email_rejected() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        register_alice(&state).await;

        let result = hr_register(
            State(state.clone()),
            Json(HrRegisterRequest {
                name: "Alice Again".to_string(),
                email: "alice@co.com".to_string(),
                department: "Eng".to_string(),
                role: None,
                password: "secret456".to_string(),
            }),
        )
        .await;

        assert!(matches!(result, Err(LmsError::Conflict(_))));
    }

    /// Seed an employee the way the HR create endpoint does, returning the
    /// setup token embedded in the emailed link.
    async fn seed_pending_employee(state: &AppState, hr_id: &str) -> (String, String) {
        let setup_token = generate_token();
        let employee = crate::db::models::Employee {
            id: Uuid::new_v4().to_string(),
            name: "Bob".to_string(),
            email: "bob@co.com".to_string(),
            department: "Eng".to_string(),
            identity_number: None,
            phone_number: None,
            position: None,
            hr_id: hr_id.to_string(),
            password_hash: None,
            is_password_set: false,
            setup_token: Some(setup_token.clone()),
            setup_token_expiry: Some(
                chrono::Utc::now().timestamp() + crate::auth::setup_token::SETUP_TOKEN_TTL_SECS,
            ),
            is_active: true,
            last_login_at: None,
            avatar: None,
            created_at: now_rfc3339(),
            updated_at: now_rfc3339(),
        };
        state.employee_repo.create(&employee).await.unwrap();
        (employee.id, setup_token)
    }

    #[tokio::test]
    async fn test_employee_onboarding_flow() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let state = test_state(&temp_dir);

        let registered = register_alice(&state).await;
        let hr_id = registered["user"]["id"].as_str().unwrap();
        let (_employee_id, token) = seed_pending_employee(&state, hr_id).await;

        // The setup link previews Bob's identity
        let response = verify_setup_token(State(state.clone()), Path(token.clone()))
            .await
            .unwrap()
            .into_response();
        let body = response_json(response).await;
        assert_eq!(body["employee"]["name"], "Bob");
        assert_eq!(body["employee"]["email"], "bob@co.com");
        assert_eq!(body["employee"]["department"], "Eng");

        // Logging in before setup fails with the setup-specific message
        let premature = employee_login(
            State(state.clone()),
            Json(LoginRequest {
                email: "bob@co.com".to_string(),
                password: "hunter2hunter2".to_string(),
            }),
        )
        .await;
        match premature {
            Err(LmsError::ValidationError(msg)) => assert!(msg.contains("Password not set")),
            other => panic!("expected setup-specific rejection, got {:?}", other.is_ok()),
        }

        // Exchange the token for a password
        employee_set_password(
            State(state.clone()),
            Json(SetPasswordRequest {
                token: token.clone(),
                password: "hunter2hunter2".to_string(),
                confirm_password: "hunter2hunter2".to_string(),
            }),
        )
        .await
        .unwrap();

        // The one-time law: the same token can never be exchanged twice
        let replay = employee_set_password(
            State(state.clone()),
            Json(SetPasswordRequest {
                token: token.clone(),
                password: "another-password".to_string(),
                confirm_password: "another-password".to_string(),
            }),
        )
        .await;
        assert!(matches!(replay, Err(LmsError::ValidationError(_))));

        // Login now succeeds and the token carries type employee
        let response = employee_login(
            State(state.clone()),
            Json(LoginRequest {
                email: "bob@co.com".to_string(),
                password: "hunter2hunter2".to_string(),
            }),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        let claims = verify_token(body["token"].as_str().unwrap(), SECRET).unwrap();
        assert_eq!(claims.principal, PrincipalType::Employee);
        assert!(body["user"]["last_login_at"].is_string());
    }

    #[tokio::test]
    async fn test_deactivated_employee_login_gets_specific_message() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let state = test_state(&temp_dir);

        let registered = register_alice(&state).await;
        let hr_id = registered["user"]["id"].as_str().unwrap().to_string();
        let (employee_id, token) = seed_pending_employee(&state, &hr_id).await;

        employee_set_password(
            State(state.clone()),
            Json(SetPasswordRequest {
                token,
                password: "hunter2hunter2".to_string(),
                confirm_password: "hunter2hunter2".to_string(),
            }),
        )
        .await
        .unwrap();

        state
            .employee_repo
            .set_active(&employee_id, &hr_id, false, &now_rfc3339())
            .await
            .unwrap();

        // Correct password, deactivated account: 403 with its own message,
        // not the generic invalid-credentials rejection
        let result = employee_login(
            State(state.clone()),
            Json(LoginRequest {
                email: "bob@co.com".to_string(),
                password: "hunter2hunter2".to_string(),
            }),
        )
        .await;

        match result {
            Err(LmsError::PermissionDenied(msg)) => assert!(msg.contains("deactivated")),
            other => panic!("expected PermissionDenied, got {:?}", other.is_ok()),
        }
    }

    #[tokio::test]
    async fn test_short_password_rejected_everywhere() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let state = test_state(&temp_dir);

        let result = hr_register(
            State(state.clone()),
            Json(HrRegisterRequest {
                name: "Alice".to_string(),
                email: "alice@co.com".to_string(),
                department: "Eng".to_string(),
                role: None,
                password: "short".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(LmsError::ValidationError(_))));

        let result = employee_set_password(
            State(state.clone()),
            Json(SetPasswordRequest {
                token: "whatever".to_string(),
                password: "short".to_string(),
                confirm_password: "short".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(LmsError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_forgot_password_stores_token_despite_mail_failure() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let state = test_state(&temp_dir);
        let registered = register_alice(&state).await;
        let hr_id = registered["user"]["id"].as_str().unwrap();

        // The mailer is unconfigured, so delivery fails; the reset token must
        // still be persisted and exchangeable
        let response = hr_forgot_password(
            State(state.clone()),
            Json(ForgotPasswordRequest {
                email: "alice@co.com".to_string(),
            }),
        )
        .await
        .unwrap()
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let user = state.hr_repo.find_by_id(hr_id).await.unwrap().unwrap();
        let token = user.reset_token.expect("reset token stored");

        hr_reset_password(
            State(state.clone()),
            Json(ResetPasswordRequest {
                token,
                password: "brand-new-pass".to_string(),
            }),
        )
        .await
        .unwrap();

        // The new credential works
        let login = hr_login(
            State(state.clone()),
            Json(LoginRequest {
                email: "alice@co.com".to_string(),
                password: "brand-new-pass".to_string(),
            }),
        )
        .await;
        assert!(login.is_ok());
    }
}
