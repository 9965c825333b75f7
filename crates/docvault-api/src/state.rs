//! Application state shared across all handlers.

use std::sync::Arc;

use docvault_auth::PrincipalLoader;
use docvault_core::config::AppConfig;
use docvault_database::Store;
use docvault_service::{AccessControlFacade, DirectoryService};

/// Application state passed to every handler via `State<AppState>`.
///
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Single entry point for resource operations
    pub access: Arc<AccessControlFacade>,
    /// Group and role administration
    pub directory: Arc<DirectoryService>,
    /// Builds principals for authenticated callers
    pub principals: Arc<PrincipalLoader>,
    /// Backend, for liveness checks
    pub store: Arc<dyn Store>,
}

impl AppState {
    /// Wire every service over `store`.
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let access = AccessControlFacade::new(
            Arc::clone(&store),
            config.paths.clone(),
            config.shares.clone(),
            config.access.clone(),
        );
        Self {
            access: Arc::new(access),
            directory: Arc::new(DirectoryService::new(Arc::clone(&store))),
            principals: Arc::new(PrincipalLoader::new(Arc::clone(&store))),
            store,
            config: Arc::new(config),
        }
    }
}
