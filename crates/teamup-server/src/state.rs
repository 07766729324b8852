//! Shared application state.

use std::sync::Arc;

use teamup_core::{StorageBackend, TeamUpConfig};
use teamup_social::{AccountService, ConnectionGraph};
use teamup_store::{MemoryUserStore, SqliteUserStore, UserRepository};
use tracing::info;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: TeamUpConfig,
    pub repo: Arc<dyn UserRepository>,
    pub graph: ConnectionGraph,
    pub accounts: AccountService,
}

impl AppState {
    pub fn new(config: TeamUpConfig, repo: Arc<dyn UserRepository>) -> Self {
        Self {
            graph: ConnectionGraph::new(repo.clone()),
            accounts: AccountService::new(repo.clone()),
            config,
            repo,
        }
    }

    /// Build state with the backend named in `config`.
    pub fn open(config: TeamUpConfig) -> teamup_core::Result<Self> {
        let repo: Arc<dyn UserRepository> = match config.storage {
            StorageBackend::Memory => Arc::new(MemoryUserStore::new()),
            StorageBackend::Sqlite => {
                config.data_paths.ensure_dirs()?;
                Arc::new(SqliteUserStore::open(&config.data_paths.db_dir)?)
            }
        };
        info!("User storage: {}", repo.backend_name());
        Ok(Self::new(config, repo))
    }
}
