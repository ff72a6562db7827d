use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::app::AppState;
use crate::error::ApiError;

/// Only the owner of `/api/todos/:id` may modify or delete it.
///
/// Route layer for the mutating methods; runs after JWT authentication.
pub async fn ensure_todo_owner(
    State(state): State<AppState>,
    Path(todo_id): Path<String>,
    user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state.ownership.check(&todo_id, &user.identity_id).await?;
    Ok(next.run(request).await)
}
