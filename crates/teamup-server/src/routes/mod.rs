//! HTTP route handlers. Paths and JSON field names match the web client.

pub mod accounts;
pub mod connections;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use teamup_core::{Error, Result, UserId};

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(accounts::routes())
        .merge(connections::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Field checks a request body must pass before reaching the core.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub(crate) fn require_id(field: &str, id: UserId) -> Result<()> {
    if id <= 0 {
        return Err(Error::Validation(format!("{} must be a positive user id", field)));
    }
    Ok(())
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} is required", field)));
    }
    Ok(())
}
