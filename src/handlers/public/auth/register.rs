use axum::{extract::State, Json};
use serde::Deserialize;

use super::utils::{validate_email_format, validate_password, validate_username_format};
use crate::app::AppState;
use crate::auth::credentials::hash_password;
use crate::database::{Account, Role};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: Option<String>,
    pub password: String,
}

/// POST /api/register - Create a new account
///
/// Self-registration always yields the `user` role; admins come from the
/// bootstrap configuration. Duplicate emails answer `409`.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Account> {
    let email = payload.email.trim();
    validate_email_format(email).map_err(ApiError::bad_request)?;
    validate_password(&payload.password).map_err(ApiError::bad_request)?;

    // Without an explicit username the email's local part stands in, under the same rules.
    let username = match payload.username.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => {
            validate_username_format(name).map_err(ApiError::bad_request)?;
            name.to_string()
        }
        _ => {
            let local = email.split('@').next().unwrap_or(email);
            validate_username_format(local).map_err(|reason| {
                ApiError::bad_request(format!(
                    "Username required: email local part is not a valid username ({})",
                    reason
                ))
            })?;
            local.to_string()
        }
    };

    let hash = hash_password(&payload.password, state.config.security.bcrypt_cost).await?;
    let account = state
        .store
        .insert_account(email, &username, Role::User, hash)
        .await?;

    Ok(ApiResponse::created(account))
}
