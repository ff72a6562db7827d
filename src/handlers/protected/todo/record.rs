use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::Todo;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

/// GET /api/todos/:id - Read a single todo
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Todo> {
    state
        .store
        .get_todo(&id)
        .await
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found(format!("todo {} not found", id)))
}

/// PUT|PATCH /api/todos/:id - Update title and/or completion
///
/// Ownership is enforced by the route layer before this runs.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTodoRequest>,
) -> ApiResult<Todo> {
    let title = match payload.title {
        Some(title) if title.trim().is_empty() => {
            return Err(ApiError::bad_request("Title cannot be empty"))
        }
        Some(title) => Some(title.trim().to_string()),
        None => None,
    };
    if title.is_none() && payload.completed.is_none() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let todo = state.store.update_todo(&id, title, payload.completed).await?;
    Ok(ApiResponse::success(todo))
}

/// DELETE /api/todos/:id - Delete a todo
///
/// Ownership is enforced by the route layer before this runs.
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    state.store.delete_todo(&id).await?;
    Ok(ApiResponse::success(json!({ "message": "Todo deleted successfully" })))
}
