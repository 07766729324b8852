//! Signup, login, user directory and health routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::warn;

use super::{require_text, Validate};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;
use teamup_core::{Error, Result, UserId};
use teamup_social::NewAccount;
use teamup_store::UserPublic;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
}

// ---------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SignupBody {
    name: String,
    email: String,
    #[serde(default)]
    skills: Option<String>,
    password: String,
}

impl Validate for SignupBody {
    fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("email", &self.email)?;
        require_text("password", &self.password)
    }
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

impl Validate for LoginBody {
    fn validate(&self) -> Result<()> {
        require_text("email", &self.email)?;
        require_text("password", &self.password)
    }
}

// ---------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let (status, users) = match state.accounts.count() {
        Ok(n) => ("healthy", Some(n)),
        Err(e) => {
            warn!("Health check could not count users: {}", e);
            ("degraded", None)
        }
    };
    Json(serde_json::json!({
        "status": status,
        "service": "teamup",
        "users": users,
        "storage": state.repo.backend_name(),
    }))
}

/// POST /signup. Password hashing runs off the async workers.
async fn signup(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<SignupBody>,
) -> ApiResult<Json<serde_json::Value>> {
    body.validate()?;
    let account = NewAccount {
        name: body.name,
        email: body.email,
        skills: body.skills.unwrap_or_default(),
        password: body.password,
    };

    tokio::task::spawn_blocking(move || state.accounts.signup(account))
        .await
        .map_err(|e| ApiError(Error::Internal(e.to_string())))??;

    Ok(Json(serde_json::json!({ "message": "Signup successful" })))
}

/// POST /login
async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<LoginBody>,
) -> ApiResult<Json<serde_json::Value>> {
    body.validate()?;
    let user = tokio::task::spawn_blocking(move || state.accounts.login(&body.email, &body.password))
        .await
        .map_err(|e| ApiError(Error::Internal(e.to_string())))??;

    Ok(Json(serde_json::json!({
        "message": "Login successful",
        "user": user,
    })))
}

/// GET /users: everyone, for finding people to connect with.
async fn list_users(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<UserPublic>>> {
    Ok(Json(state.accounts.directory()?))
}

/// GET /users/:id
async fn get_user(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<UserId>,
) -> ApiResult<Json<UserPublic>> {
    Ok(Json(state.accounts.get(id)?))
}
