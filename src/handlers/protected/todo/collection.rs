use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::database::Todo;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct TodoCount {
    pub count: usize,
}

/// POST /api/todos - Create a todo owned by the caller
///
/// Expected Input:
/// ```json
/// { "title": "buy milk" }
/// ```
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTodoRequest>,
) -> ApiResult<Todo> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }

    let todo = state.store.insert_todo(&user.identity_id, title).await?;
    Ok(ApiResponse::created(todo))
}

/// GET /api/todos - The caller's todos
pub async fn list(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<Todo>> {
    Ok(ApiResponse::success(
        state.store.list_todos_by_owner(&user.identity_id).await,
    ))
}

/// GET /api/todos/count - Number of todos the caller owns
pub async fn count(State(state): State<AppState>, user: AuthUser) -> ApiResult<TodoCount> {
    let count = state.store.count_todos_by_owner(&user.identity_id).await;
    Ok(ApiResponse::success(TodoCount { count }))
}

/// GET /api/users/:id/todos - Any user's todos (admin only)
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<Todo>> {
    ensure_account_exists(&state, &user_id).await?;
    Ok(ApiResponse::success(state.store.list_todos_by_owner(&user_id).await))
}

/// GET /api/users/:id/todos/count - Number of todos a user owns (admin only)
pub async fn count_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<TodoCount> {
    ensure_account_exists(&state, &user_id).await?;
    let count = state.store.count_todos_by_owner(&user_id).await;
    Ok(ApiResponse::success(TodoCount { count }))
}

async fn ensure_account_exists(state: &AppState, user_id: &str) -> Result<(), ApiError> {
    match state.store.find_account_by_id(user_id).await {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found("user not found")),
    }
}
