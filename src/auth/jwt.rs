//! JWT token generation and validation

use crate::core::error::{LmsError, Result};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Principal kind carried in the token's `type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalType {
    Hr,
    Employee,
    User,
}

impl PrincipalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalType::Hr => "hr",
            PrincipalType::Employee => "employee",
            PrincipalType::User => "user",
        }
    }

    /// Session lifetime per principal kind. HR sessions are short-lived;
    /// employee and legacy user tokens double as a week-long session since
    /// there is no refresh flow.
    pub fn token_lifetime(&self) -> chrono::Duration {
        match self {
            PrincipalType::Hr => chrono::Duration::days(1),
            PrincipalType::Employee | PrincipalType::User => chrono::Duration::days(7),
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub email: String,
    #[serde(rename = "type")]
    pub principal: PrincipalType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

/// Generate a session token for a principal
pub fn issue_token(
    user_id: &str,
    email: &str,
    principal: PrincipalType,
    role: Option<&str>,
    secret: &str,
) -> Result<String> {
    issue_token_with_lifetime(user_id, email, principal, role, principal.token_lifetime(), secret)
}

/// Generate a session token with an explicit lifetime
pub fn issue_token_with_lifetime(
    user_id: &str,
    email: &str,
    principal: PrincipalType,
    role: Option<&str>,
    lifetime: chrono::Duration,
    secret: &str,
) -> Result<String> {
    let issued_at = chrono::Utc::now();
    let expiration = issued_at
        .checked_add_signed(lifetime)
        .ok_or_else(|| LmsError::AuthenticationError("Failed to calculate expiration".to_string()))?;

    let claims = Claims {
        user_id: user_id.to_string(),
        email: email.to_string(),
        principal,
        role: role.map(|r| r.to_string()),
        iat: issued_at.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| LmsError::AuthenticationError(format!("Failed to generate token: {}", e)))
}

/// Validate a session token and extract claims
///
/// Expired tokens fail with a distinct error so callers can tell an elapsed
/// session apart from a malformed or forged one.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => {
            LmsError::TokenExpired("Token has expired. Please login again.".to_string())
        }
        _ => LmsError::AuthenticationError("Invalid token format".to_string()),
    })?;

    Ok(token_data.claims)
}
