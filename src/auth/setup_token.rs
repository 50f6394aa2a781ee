//! One-time password setup and reset tokens
//!
//! These are opaque random values stored alongside a credential record and
//! exchanged exactly once for a password hash. They are unrelated to the
//! session token codec.

use rand::rngs::OsRng;
use rand::RngCore;

/// Lifetime of an employee's initial password-setup link
pub const SETUP_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Lifetime of an HR password-reset link
pub const RESET_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Generate an unguessable one-time token: 32 bytes from the OS RNG,
/// hex-encoded (256 bits of entropy).
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Why a presented one-time token is not exchangeable.
///
/// Three distinct reasons aid support diagnosis without revealing principal
/// existence to unauthenticated callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Matches a stored token within its validity window
    Valid,
    /// The token was already exchanged for a password
    Consumed,
    /// The validity window has elapsed; the stored token stays in place
    Expired,
}

/// Classify a stored token against the current time.
pub fn classify(consumed: bool, expiry: Option<i64>, now: i64) -> TokenState {
    if consumed {
        return TokenState::Consumed;
    }
    match expiry {
        Some(expiry) if expiry > now => TokenState::Valid,
        _ => TokenState::Expired,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique_and_hex() {
        let a = generate_token();
        let b = generate_token();

        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_classify_valid() {
        assert_eq!(classify(false, Some(1000), 999), TokenState::Valid);
    }

    #[test]
    fn test_classify_expired() {
        assert_eq!(classify(false, Some(1000), 1000), TokenState::Expired);
        assert_eq!(classify(false, Some(1000), 2000), TokenState::Expired);
        // A token with no recorded expiry is never exchangeable
        assert_eq!(classify(false, None, 0), TokenState::Expired);
    }

    #[test]
    fn test_classify_consumed_wins() {
        // Consumption is terminal even if an expiry somehow remains
        assert_eq!(classify(true, Some(i64::MAX), 0), TokenState::Consumed);
    }
}
