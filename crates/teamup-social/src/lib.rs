//! Team-Up social layer: connection requests, accounts, credentials.

pub mod accounts;
pub mod audit;
pub mod connections;
pub mod password;

pub use accounts::{AccountService, NewAccount};
pub use audit::{audit_users, Violation};
pub use connections::ConnectionGraph;
