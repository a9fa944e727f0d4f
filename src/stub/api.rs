use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch},
};
use serde::{Deserialize, Serialize};
use taskboard_common::ActivityEntry;
use tracing::{debug, info};

use super::store::{StoreError, StoreHandle};
use crate::api::{
    AssignSprintRequest, CreateItemRequest, CreateLaneRequest, MoveItemRequest,
    UpdateItemRequest, UpdateMemberRequest,
};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub store: StoreHandle,
}

pub type SharedState = Arc<AppState>;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentCreated {
    pub id: i64,
}

// ── Error type ────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Unavailable(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::BadRequest(msg) => ApiError::BadRequest(msg),
            StoreError::Rejected(msg) => ApiError::Conflict(msg),
            StoreError::Unavailable(msg) => ApiError::Unavailable(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route(
            "/api/v1/projects/{id}/lanes",
            get(list_lanes).post(create_lane),
        )
        .route(
            "/api/v1/projects/{id}/items",
            get(list_items).post(create_item),
        )
        .route("/api/v1/projects/{id}/sprints", get(list_sprints))
        .route("/api/v1/projects/{id}/members", get(list_members))
        .route("/api/v1/projects/{id}/roles", get(list_roles))
        .route(
            "/api/v1/items/{id}",
            patch(update_item).delete(delete_item),
        )
        .route("/api/v1/items/{id}/move", patch(move_item))
        .route("/api/v1/items/{id}/sprint", patch(assign_sprint))
        .route(
            "/api/v1/items/{id}/activity",
            get(list_activity).post(record_activity),
        )
        .route(
            "/api/v1/items/{id}/comments",
            axum::routing::post(create_comment),
        )
        .route(
            "/api/v1/items/{id}/comments/{comment_id}",
            delete(delete_comment),
        )
        .route("/api/v1/members/{id}", patch(update_member))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn list_lanes(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let lanes = state.store.with(|s| s.lanes(project_id))?;
    Ok(Json(lanes))
}

async fn create_lane(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
    Json(req): Json<CreateLaneRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let lane = state.store.with(|s| s.create_lane(project_id, &req))?;
    info!(project_id, lane_id = lane.id, "lane created");
    Ok((StatusCode::CREATED, Json(lane)))
}

async fn list_items(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.store.with(|s| s.items(project_id))?;
    Ok(Json(items))
}

async fn create_item(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
    Json(req): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.store.with(|s| s.create_item(project_id, &req))?;
    info!(project_id, item_id = item.id, "item created");
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_item(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.store.with(|s| s.update_item(id, &req))?;
    Ok(Json(item))
}

async fn delete_item(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.with(|s| s.delete_item(id))?;
    info!(item_id = id, "item deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn move_item(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<MoveItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.store.with(|s| s.move_item(id, &req));
    match &result {
        Ok(_) => info!(item_id = id, column = %req.column, lane_id = ?req.lane_id, index = req.index, "item moved"),
        Err(err) => info!(item_id = id, error = %err, "move refused"),
    }
    Ok(Json(result?))
}

async fn assign_sprint(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<AssignSprintRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.store.with(|s| s.assign_sprint(id, &req))?;
    Ok(Json(item))
}

async fn list_sprints(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let sprints = state.store.with(|s| s.sprints(project_id))?;
    Ok(Json(sprints))
}

async fn list_activity(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state.store.with(|s| s.activity(id))?;
    Ok(Json(entries))
}

async fn record_activity(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(entry): Json<ActivityEntry>,
) -> Result<impl IntoResponse, ApiError> {
    if entry.item_id != id {
        return Err(ApiError::BadRequest(format!(
            "Entry is for item {}, not {}",
            entry.item_id, id
        )));
    }
    debug!(item_id = id, action = %entry.action, "activity recorded");
    state.store.with(|s| s.record_activity(entry))?;
    Ok(StatusCode::CREATED)
}

async fn create_comment(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment_id = state.store.with(|s| s.add_comment(id, &req.text))?;
    Ok((StatusCode::CREATED, Json(CommentCreated { id: comment_id })))
}

async fn delete_comment(
    State(state): State<SharedState>,
    Path((id, comment_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.with(|s| s.delete_comment(id, comment_id))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_members(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let members = state.store.with(|s| s.members(project_id))?;
    Ok(Json(members))
}

async fn list_roles(
    State(state): State<SharedState>,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let roles = state.store.with(|s| s.roles(project_id))?;
    Ok(Json(roles))
}

async fn update_member(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateMemberRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let member = state.store.with(|s| s.update_member_role(id, req.role_id))?;
    info!(member_id = id, role_id = req.role_id, "member role changed");
    Ok(Json(member))
}
