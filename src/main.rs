//! Learning Management System Backend
//!
//! A role-based learning management backend with JWT authentication,
//! email-driven onboarding, and profile image uploads.

use lms_backend::{api, core, db};

use anyhow::Result;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (handles CLI args, env vars, and config file)
    let config = match core::config::Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Print error to stderr since logging isn't initialized yet
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Initialize logging system based on configuration
    let _logger = match core::Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return Err(e);
        }
    };

    info!("Configuration loaded successfully");
    info!("Starting LMS Backend v{}", env!("CARGO_PKG_VERSION"));
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Server configuration"
    );
    info!(
        path = ?config.database.path,
        "Database configuration"
    );

    if config.security.is_dev_secret() {
        warn!(
            "The JWT signing secret is still the development default; \
             set LMS_SECURITY__JWT_SECRET before exposing this server"
        );
    }
    if !config.email.is_configured() {
        warn!("SMTP credentials not configured; onboarding and reset emails will not be delivered");
    }

    // Ensure the upload directory exists
    if !config.storage.upload_dir.exists() {
        info!("Creating upload directory: {:?}", config.storage.upload_dir);
        std::fs::create_dir_all(&config.storage.upload_dir).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create directory {:?}: {}",
                config.storage.upload_dir,
                e
            )
        })?;
    }

    // Initialize database
    info!("Initializing database...");
    let db = std::sync::Arc::new(db::DatabaseManager::new(
        &config.database.path,
        config.database.connection_pool_size as u32,
        std::time::Duration::from_millis(config.database.busy_timeout),
    )?);
    info!("Database initialized successfully");

    // Initialize API server
    info!("Initializing HTTP server...");
    let server_url = format!("http://{}:{}", config.server.host, config.server.port);
    let server = api::ApiServer::new(config, db)?;

    info!("LMS Backend initialized successfully");
    info!(url = %server_url, "Server ready - starting to serve requests");

    // Start serving (this will block until shutdown signal)
    server.serve().await?;

    Ok(())
}
