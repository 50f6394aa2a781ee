//! Core application layer
//!
//! This module provides the cross-cutting infrastructure:
//! - Configuration management
//! - Structured logging system
//! - Error handling and type system
//! - Uploaded avatar file storage

pub mod config;
pub mod logging;
pub mod error;
pub mod storage;

pub use config::Config;
pub use logging::Logger;
pub use error::{LmsError, ErrorResponse, Result};
pub use storage::AvatarStore;
