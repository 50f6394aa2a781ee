//! Password hashing and verification using bcrypt

use crate::core::error::{LmsError, Result};

/// bcrypt cost factor for all stored password hashes
pub const BCRYPT_COST: u32 = 12;

/// A syntactically valid bcrypt hash used to equalize timing.
///
/// Login paths compare against this when no credential record exists, so the
/// unknown-email branch costs the same as a real comparison. The comparison
/// result is always discarded.
pub const PHANTOM_HASH: &str = "$2y$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW";

/// Hash a password using bcrypt
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| LmsError::AuthenticationError(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash)
        .map_err(|e| LmsError::AuthenticationError(format!("Failed to verify password: {}", e)))
}
