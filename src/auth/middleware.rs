//! Authorization guard
//!
//! One parameterized middleware covers every protected route group. A
//! `GuardPolicy` picks the required principal kind and which liveness checks
//! apply; on success a normalized `Identity` is attached to the request so
//! handlers never reach back into the token.

use crate::auth::jwt::{verify_token, PrincipalType};
use crate::core::error::{LmsError, Result};
use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Per-route-group authorization requirements
#[derive(Debug, Clone, Copy)]
pub struct GuardPolicy {
    pub required: PrincipalType,
    pub require_active: bool,
    pub require_password_set: bool,
}

impl GuardPolicy {
    /// HR-only routes. HR accounts carry no activity flag.
    pub fn hr() -> Self {
        Self {
            required: PrincipalType::Hr,
            require_active: false,
            require_password_set: false,
        }
    }

    /// Employee-only routes: the account must be active and onboarded.
    pub fn employee() -> Self {
        Self {
            required: PrincipalType::Employee,
            require_active: true,
            require_password_set: true,
        }
    }

    /// Legacy generic-user routes.
    pub fn user() -> Self {
        Self {
            required: PrincipalType::User,
            require_active: true,
            require_password_set: true,
        }
    }
}

/// Normalized identity attached to authorized requests
#[derive(Clone, Debug)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub principal: PrincipalType,
    pub role: Option<String>,
}

/// Authorization middleware, parameterized by a `GuardPolicy`
pub async fn authorize(
    state: crate::api::handlers::AppState,
    policy: GuardPolicy,
    mut request: Request,
    next: Next,
) -> Response {
    // 1. Extract bearer token from the Authorization header
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer ").map(|t| t.to_string()));

    let token = match token {
        Some(t) => t,
        None => {
            let error = LmsError::AuthenticationError("Access token is required".to_string());
            return error.into_response();
        }
    };

    // 2. Verify the token; expired and malformed map to distinct errors
    let claims = match verify_token(&token, &state.jwt_secret) {
        Ok(c) => c,
        Err(e) => return e.into_response(),
    };

    // 3. The type claim decides which credential store to consult
    if claims.principal != policy.required {
        let error = LmsError::PermissionDenied(format!(
            "Access denied. {} privileges required.",
            match policy.required {
                PrincipalType::Hr => "HR",
                PrincipalType::Employee => "Employee",
                PrincipalType::User => "User",
            }
        ));
        return error.into_response();
    }

    // 4. Re-fetch the live principal; tokens must not outlive deleted accounts
    let identity = match load_principal(&state, &claims.user_id, policy).await {
        Ok(identity) => identity,
        Err(e) => return e.into_response(),
    };

    // 5. Attach the normalized identity for downstream handlers
    request.extensions_mut().insert(identity);

    next.run(request).await
}

async fn load_principal(
    state: &crate::api::handlers::AppState,
    user_id: &str,
    policy: GuardPolicy,
) -> Result<Identity> {
    use crate::db::repository::Repository;

    match policy.required {
        PrincipalType::Hr => {
            let user = state
                .hr_repo
                .find_by_id(user_id)
                .await?
                .ok_or_else(|| LmsError::AuthenticationError("HR user not found".to_string()))?;

            Ok(Identity {
                id: user.id,
                email: user.email,
                principal: PrincipalType::Hr,
                role: Some(user.role),
            })
        }
        PrincipalType::Employee => {
            let employee = state
                .employee_repo
                .find_by_id(user_id)
                .await?
                .ok_or_else(|| {
                    LmsError::AuthenticationError("Invalid token. Employee not found.".to_string())
                })?;

            if policy.require_active && !employee.is_active {
                return Err(LmsError::PermissionDenied(
                    "Your account has been deactivated. Please contact HR.".to_string(),
                ));
            }

            if policy.require_password_set && !employee.is_password_set {
                return Err(LmsError::PermissionDenied(
                    "Password not set. Please complete account setup.".to_string(),
                ));
            }

            Ok(Identity {
                id: employee.id,
                email: employee.email,
                principal: PrincipalType::Employee,
                role: None,
            })
        }
        PrincipalType::User => {
            let user = state
                .user_repo
                .find_by_id(user_id)
                .await?
                .ok_or_else(|| LmsError::AuthenticationError("User not found".to_string()))?;

            if policy.require_active && !user.is_active {
                return Err(LmsError::PermissionDenied(
                    "Your account has been deactivated. Please contact HR.".to_string(),
                ));
            }

            if policy.require_password_set && !user.is_password_set {
                return Err(LmsError::PermissionDenied(
                    "Password not set. Please complete account setup.".to_string(),
                ));
            }

            Ok(Identity {
                id: user.id,
                email: user.email,
                principal: PrincipalType::User,
                role: None,
            })
        }
    }
}

// Implement FromRequestParts for Identity to enable extraction in handlers
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = LmsError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or_else(|| LmsError::AuthenticationError("Not authenticated".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policies() {
        let hr = GuardPolicy::hr();
        assert_eq!(hr.required, PrincipalType::Hr);
        assert!(!hr.require_active);
        assert!(!hr.require_password_set);

        let employee = GuardPolicy::employee();
        assert_eq!(employee.required, PrincipalType::Employee);
        assert!(employee.require_active);
        assert!(employee.require_password_set);

        let user = GuardPolicy::user();
        assert_eq!(user.required, PrincipalType::User);
        assert!(user.require_active);
    }
}
