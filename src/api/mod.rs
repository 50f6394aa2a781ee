//! REST API module
//!
//! This module provides the HTTP server and REST API endpoints including:
//! - API routing and request handling
//! - Handler state and request/response models
//! - Error handling and response formatting

pub mod server;
pub mod routes;
pub mod handlers;
pub mod models;

pub use server::ApiServer;
