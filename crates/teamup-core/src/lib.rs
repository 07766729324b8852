//! Team-Up core: error type, configuration, user id allocation.

pub mod config;
pub mod error;
pub mod ids;

pub use config::{DataPaths, StorageBackend, TeamUpConfig, MAX_CONNECTIONS};
pub use error::{Error, LimitSide, Result};
pub use ids::{next_user_id, observe_user_id, UserId};
