use axum::extract::State;
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub id: String,
    pub email: String,
    pub username: String,
    pub role: String,
}

/// GET /api/auth/whoami - Current authenticated user
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": { "id": "user_uuid", "email": "a@x.com", "username": "a", "role": "user" }
/// }
/// ```
///
/// The role reported is the one carried by the token.
pub async fn whoami(State(state): State<AppState>, user: AuthUser) -> ApiResult<WhoAmI> {
    let account = state
        .store
        .find_account_by_id(&user.identity_id)
        .await
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    Ok(ApiResponse::success(WhoAmI {
        id: account.id,
        email: account.email,
        username: account.username,
        role: user.role.as_str().to_string(),
    }))
}
