//! DocVault Server: hierarchical access control over a virtual file tree.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use docvault_api::{AppState, build_app};
use docvault_core::config::{AppConfig, DatabaseBackend};
use docvault_core::error::AppError;
use docvault_database::{MemoryStore, Store, open_postgres};
use docvault_service::DirectoryService;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration for the environment named by `DOCVAULT_ENV`
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("DOCVAULT_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting DocVault v{}", env!("CARGO_PKG_VERSION"));

    let store = open_store(&config).await?;

    let directory = DirectoryService::new(Arc::clone(&store));
    let roles = directory.seed_default_roles().await?;
    tracing::info!("Default roles ready ({})", roles.len());

    let bind_addr = config.server.bind_address();
    let app = build_app(AppState::new(config, Arc::clone(&store)));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", bind_addr, e)))?;

    tracing::info!("DocVault listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    store.close().await;
    tracing::info!("DocVault stopped");
    Ok(())
}

/// Open the configured persistence backend
async fn open_store(config: &AppConfig) -> Result<Arc<dyn Store>, AppError> {
    match config.database.backend {
        DatabaseBackend::Memory => {
            tracing::warn!("Using the in-memory store; state is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        DatabaseBackend::Postgres => {
            Ok(Arc::new(open_postgres(&config.database).await?))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
