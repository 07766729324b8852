//! Team-Up HTTP server: axum routes over the connection graph.

pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod validate;

pub use error::{ApiError, ApiResult};
pub use extract::{ApiJson, ApiPath};
pub use routes::build_router;
pub use state::AppState;
