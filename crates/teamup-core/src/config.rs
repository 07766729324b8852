//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Hard cap on accepted connections per user.
pub const MAX_CONNECTIONS: usize = 5;

/// Paths to Team-Up data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// SQLite database directory (`data/db/`).
    pub db_dir: PathBuf,
}

impl DataPaths {
    /// Build data paths under a root directory. Nothing is created on disk.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            db_dir: root.join("db"),
            root,
        }
    }

    /// Create the directories the SQLite backend needs.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.db_dir)
    }
}

/// Where user records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-lifetime map, lost on restart.
    Memory,
    /// SQLite file under `DataPaths::db_dir`.
    Sqlite,
}

impl std::str::FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::Config(format!("unknown storage backend: {}", other))),
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Top-level Team-Up configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamUpConfig {
    /// HTTP bind host.
    pub host: String,
    /// HTTP server port.
    pub port: u16,
    /// Storage backend for user records.
    pub storage: StorageBackend,
    /// Data directory paths.
    pub data_paths: DataPaths,
}

impl TeamUpConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> Result<Self> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);
        let storage = match std::env::var("TEAMUP_STORAGE") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::Memory,
        };

        Ok(Self::new(host, port, storage, data_dir))
    }

    pub fn new(
        host: impl Into<String>,
        port: u16,
        storage: StorageBackend,
        data_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            storage,
            data_paths: DataPaths::new(data_dir),
        }
    }

    /// `host:port` string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!(" SQLite ".parse::<StorageBackend>().unwrap(), StorageBackend::Sqlite);
        assert!(matches!(
            "mongo".parse::<StorageBackend>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_data_paths_created_on_demand() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = DataPaths::new(dir.path().join("data"));
        assert!(!paths.db_dir.exists());
        paths.ensure_dirs().unwrap();
        assert!(paths.db_dir.is_dir());
    }

    #[test]
    fn test_bind_addr() {
        let config = TeamUpConfig::new("127.0.0.1", 5000, StorageBackend::Memory, "data");
        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
    }
}
