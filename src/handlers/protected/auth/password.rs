use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::app::AppState;
use crate::auth::credentials::{check_password, hash_password};
use crate::database::Account;
use crate::error::ApiError;
use crate::handlers::public::auth::utils::validate_password;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// PUT /api/change-password/:id - Change your own password
///
/// Expected Input:
/// ```json
/// { "current_password": "old", "new_password": "new" }
/// ```
pub async fn change_password(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<Value> {
    if id != user.identity_id {
        return Err(ApiError::forbidden("You can only change your own password"));
    }
    if payload.current_password.is_empty() || payload.new_password.is_empty() {
        return Err(ApiError::bad_request("Both current and new password are required"));
    }
    validate_password(&payload.new_password).map_err(ApiError::bad_request)?;

    let account = state
        .store
        .find_account_by_id(&id)
        .await
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    if !check_password(&payload.current_password, &account.password_hash).await? {
        return Err(ApiError::bad_request("Current password is incorrect"));
    }

    let hash = hash_password(&payload.new_password, state.config.security.bcrypt_cost).await?;
    state.store.update_password(&id, hash).await?;

    info!("Password changed for {}", id);
    Ok(ApiResponse::success(json!({ "message": "Password updated successfully" })))
}

/// PUT /api/reset-password/:id - Set any user's password (admin only)
///
/// Expected Input:
/// ```json
/// { "newPassword": "new" }
/// ```
pub async fn reset_password(
    State(state): State<AppState>,
    Path(id): Path<String>,
    admin: AuthUser,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<Value> {
    validate_password(&payload.new_password).map_err(ApiError::bad_request)?;

    let hash = hash_password(&payload.new_password, state.config.security.bcrypt_cost).await?;
    state.store.update_password(&id, hash).await?;

    info!("Password for {} reset by admin {}", id, admin.identity_id);
    Ok(ApiResponse::success(json!({ "message": "Password reset successfully" })))
}

/// GET /api/users - List all accounts (admin only)
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<Account>> {
    Ok(ApiResponse::success(state.store.list_accounts().await))
}
