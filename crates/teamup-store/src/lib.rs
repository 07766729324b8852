//! Team-Up store: user records behind a swappable repository.

pub mod memory;
pub mod repository;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use memory::MemoryUserStore;
pub use repository::UserRepository;
pub use sqlite::SqliteUserStore;
pub use types::*;
