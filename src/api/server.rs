//! HTTP Server implementation
//!
//! This module provides the HTTP server using Axum framework with:
//! - Configurable host/port binding
//! - Graceful shutdown handling
//! - Health check endpoint
//! - CORS support
//! - Static serving of uploaded profile images

use crate::api::handlers::AppState;
use crate::api::routes::build_api_routes;
use crate::core::config::{Config, ServerConfig};
use crate::core::storage::AvatarStore;
use crate::db::manager::DatabaseManager;
use crate::db::repository::{
    EmployeeRepository, GenericUserRepository, HrUserRepository, ModuleRepository,
};
use crate::mailer::Mailer;
use axum::{extract::DefaultBodyLimit, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

/// HTTP API Server
pub struct ApiServer {
    router: Router,
    config: ServerConfig,
}

impl ApiServer {
    /// Create a new API server with the given configuration and database manager
    pub fn new(config: Config, db: Arc<DatabaseManager>) -> anyhow::Result<Self> {
        let server_config = config.server.clone();

        // Build the router with all routes and middleware
        let router = Self::build_router(config, db)?;

        Ok(Self {
            router,
            config: server_config,
        })
    }

    /// Build the Axum router with all routes and middleware
    fn build_router(config: Config, db: Arc<DatabaseManager>) -> anyhow::Result<Router> {
        // Create repositories
        let hr_repo = Arc::new(HrUserRepository::new(db.clone()));
        let employee_repo = Arc::new(EmployeeRepository::new(db.clone()));
        let module_repo = Arc::new(ModuleRepository::new(db.clone()));
        let user_repo = Arc::new(GenericUserRepository::new(db));

        // Create collaborators from configuration; both are injected rather
        // than read ambiently per call site
        let mailer = Arc::new(Mailer::new(&config.email)?);
        let avatars = Arc::new(AvatarStore::new(
            config.storage.upload_dir.clone(),
            config.storage.public_prefix.clone(),
            config.storage.max_upload_bytes,
        ));
        avatars.ensure_dir()?;

        let jwt_secret = Arc::new(config.security.jwt_secret.clone());

        // Create application state
        let app_state = AppState {
            hr_repo,
            employee_repo,
            module_repo,
            user_repo,
            mailer,
            avatars,
            jwt_secret,
        };

        let api_router = build_api_routes(app_state);

        // Static file serving for uploaded avatars; a missing file is a plain
        // 404, which clients render as "no avatar"
        let serve_uploads = ServeDir::new(&config.storage.upload_dir);

        // Multipart profile updates carry an image; leave headroom above the
        // stored-file cap for the surrounding form fields
        let body_limit = config.storage.max_upload_bytes as usize + 64 * 1024;

        let router = api_router
            .nest_service(&config.storage.public_prefix, serve_uploads)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(Self::build_cors_layer(&config.security.allowed_origins))
                    .layer(DefaultBodyLimit::max(body_limit)),
            );

        Ok(router)
    }

    /// Build CORS layer from allowed origins configuration
    fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
        use tower_http::cors::Any;

        let cors = CorsLayer::new();

        // If allowed_origins contains "*", allow any origin
        if allowed_origins.contains(&"*".to_string()) {
            cors.allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            // Parse allowed origins
            let origins: Vec<_> = allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            cors.allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }

    /// Start the HTTP server and listen for requests
    ///
    /// This method will block until the server is shut down gracefully.
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let socket_addr: SocketAddr = addr.parse()?;

        info!(
            host = %self.config.host,
            port = self.config.port,
            request_timeout = self.config.request_timeout,
            "Starting HTTP server"
        );

        // Create TCP listener
        let listener = tokio::net::TcpListener::bind(socket_addr).await?;

        info!(addr = %socket_addr, "HTTP server listening");

        // Serve with graceful shutdown
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server shut down gracefully");

        Ok(())
    }

    /// Get a reference to the router
    pub fn router(&self) -> &Router {
        &self.router
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Initiating graceful shutdown...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{
        DatabaseConfig, EmailConfig, LoggingConfig, SecurityConfig, StorageConfig,
    };
    use std::path::PathBuf;

    fn test_config(upload_dir: PathBuf) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                request_timeout: 30,
            },
            database: DatabaseConfig {
                path: PathBuf::from(":memory:"),
                connection_pool_size: 1,
                busy_timeout: 5000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
                output: "stdout".to_string(),
                log_dir: None,
            },
            security: SecurityConfig {
                jwt_secret: "test-secret".to_string(),
                allowed_origins: vec!["*".to_string()],
            },
            storage: StorageConfig {
                upload_dir,
                public_prefix: "/uploads/profiles".to_string(),
                max_upload_bytes: 5 * 1024 * 1024,
            },
            email: EmailConfig {
                smtp_host: "smtp.gmail.com".to_string(),
                smtp_user: String::new(),
                smtp_pass: String::new(),
                from_name: "Learning Management System".to_string(),
                frontend_url: "http://localhost:5173".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_api_server_creation() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = test_config(temp_dir.path().join("uploads"));
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());

        let server = ApiServer::new(config, db);
        assert!(server.is_ok());
    }
}
