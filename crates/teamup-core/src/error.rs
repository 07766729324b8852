//! Error types for Team-Up.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which party of a connection operation hit the connection cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitSide {
    /// The caller (requester for `request`, acceptor for `accept`).
    Own,
    /// The user a request is addressed to.
    Target,
    /// The user whose request is being accepted.
    Requester,
}

impl std::fmt::Display for LimitSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Own => write!(f, "own"),
            Self::Target => write!(f, "target"),
            Self::Requester => write!(f, "requester"),
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("Connection limit reached ({0})")]
    LimitExceeded(LimitSide),

    #[error("Request already sent")]
    DuplicateRequest,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Connection request not found")]
    NoSuchRequest,

    #[error("Cannot connect to yourself")]
    SelfRequest,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error describes a rejected request rather than a failure
    /// of the service itself.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::Storage(_)
                | Self::Database(_)
                | Self::Io(_)
                | Self::Json(_)
                | Self::Config(_)
                | Self::Internal(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
