//! Connection request routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use super::{require_id, Validate};
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;
use teamup_core::{Result, UserId};
use teamup_store::Relations;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/connections/request", post(send_request))
        .route("/connections/accept", post(accept_request))
        .route("/connections/reject", post(reject_request))
        .route("/connections/remove", post(remove_connection))
        .route("/user/{user_id}/connections", get(list_connections))
}

// ---------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendRequestBody {
    from_user_id: UserId,
    to_user_id: UserId,
}

impl Validate for SendRequestBody {
    fn validate(&self) -> Result<()> {
        require_id("fromUserId", self.from_user_id)?;
        require_id("toUserId", self.to_user_id)
    }
}

/// Body shared by accept and reject.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RespondBody {
    user_id: UserId,
    requester_id: UserId,
}

impl Validate for RespondBody {
    fn validate(&self) -> Result<()> {
        require_id("userId", self.user_id)?;
        require_id("requesterId", self.requester_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveBody {
    user_id: UserId,
    other_id: UserId,
}

impl Validate for RemoveBody {
    fn validate(&self) -> Result<()> {
        require_id("userId", self.user_id)?;
        require_id("otherId", self.other_id)
    }
}

fn message(text: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": text }))
}

// ---------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------

/// POST /connections/request
async fn send_request(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<SendRequestBody>,
) -> ApiResult<Json<serde_json::Value>> {
    body.validate()?;
    state.graph.request(body.from_user_id, body.to_user_id)?;
    Ok(message("Connection request sent"))
}

/// POST /connections/accept
async fn accept_request(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<RespondBody>,
) -> ApiResult<Json<serde_json::Value>> {
    body.validate()?;
    state.graph.accept(body.user_id, body.requester_id)?;
    Ok(message("Connection accepted"))
}

/// POST /connections/reject
async fn reject_request(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<RespondBody>,
) -> ApiResult<Json<serde_json::Value>> {
    body.validate()?;
    state.graph.reject(body.user_id, body.requester_id)?;
    Ok(message("Connection rejected"))
}

/// POST /connections/remove
async fn remove_connection(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<RemoveBody>,
) -> ApiResult<Json<serde_json::Value>> {
    body.validate()?;
    state.graph.remove(body.user_id, body.other_id)?;
    Ok(message("Connection removed"))
}

/// GET /user/:userId/connections
async fn list_connections(
    State(state): State<Arc<AppState>>,
    ApiPath(user_id): ApiPath<UserId>,
) -> ApiResult<Json<Relations>> {
    let relations = state.graph.list_relations(user_id)?;
    debug!(
        "User {}: {} connections, {} pending, {} sent",
        user_id,
        relations.connections.len(),
        relations.pending_requests.len(),
        relations.sent_requests.len()
    );
    Ok(Json(relations))
}
