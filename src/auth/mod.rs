//! Authentication module
//!
//! This module provides authentication functionality including:
//! - Session token issuance and verification
//! - Password hashing and verification
//! - One-time setup/reset token lifecycle
//! - The parameterized authorization guard

pub mod jwt;
pub mod password;
pub mod setup_token;
pub mod handlers;
pub mod middleware;
pub mod models;

pub use jwt::{issue_token, verify_token, Claims, PrincipalType};
pub use password::{hash_password, verify_password};
pub use setup_token::{generate_token, TokenState};
pub use middleware::{authorize, GuardPolicy, Identity};
