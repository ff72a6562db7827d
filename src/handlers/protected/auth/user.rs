use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::database::{Account, AccountUpdate, Role};
use crate::error::ApiError;
use crate::handlers::public::auth::utils::{validate_email_format, validate_username_format};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Accounts are visible to their owner and to admins.
fn ensure_self_or_admin(user: &AuthUser, id: &str) -> Result<(), ApiError> {
    if user.identity_id == id || user.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden("You can only access your own account"))
    }
}

/// GET /api/user/:id - Fetch an account profile
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
) -> ApiResult<Account> {
    ensure_self_or_admin(&user, &id)?;

    state
        .store
        .find_account_by_id(&id)
        .await
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found("user not found"))
}

/// PUT /api/user/:id - Update username and/or email
///
/// Expected Input:
/// ```json
/// { "username": "alice", "email": "alice@x.com" }
/// ```
///
/// `role` is accepted only from admins. A role change reaches the affected
/// user's tokens at their next login.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Account> {
    ensure_self_or_admin(&user, &id)?;

    let mut update = AccountUpdate::default();

    if let Some(username) = payload.username.as_deref().map(str::trim) {
        validate_username_format(username).map_err(ApiError::bad_request)?;
        update.username = Some(username.to_string());
    }
    if let Some(email) = payload.email.as_deref().map(str::trim) {
        validate_email_format(email).map_err(ApiError::bad_request)?;
        update.email = Some(email.to_string());
    }
    if let Some(role) = payload.role.as_deref() {
        if !user.is_admin() {
            return Err(ApiError::forbidden("Admin role required to change roles"));
        }
        let role = Role::parse(role.trim())
            .ok_or_else(|| ApiError::bad_request(format!("Unknown role '{}'", role)))?;
        update.role = Some(role);
    }

    if update.is_empty() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let account = state.store.update_account(&id, update).await?;
    info!("Account {} updated by {}", id, user.identity_id);
    Ok(ApiResponse::success(account))
}

/// DELETE /api/user/:id - Remove an account and every todo it owns
///
/// Tokens already issued to the account stay valid until expiry, but every
/// lookup they drive finds nothing.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
) -> ApiResult<Value> {
    ensure_self_or_admin(&user, &id)?;

    let deleted_todos = state.store.delete_account(&id).await?;
    info!("Account {} deleted by {}", id, user.identity_id);
    Ok(ApiResponse::success(json!({
        "message": "User deleted successfully",
        "deleted_todos": deleted_todos,
    })))
}
