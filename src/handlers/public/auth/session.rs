use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::AppState;
use crate::auth::AuthError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: i64,
    pub expires_in: i64,
    pub user: LoginUser,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: String,
    pub role: String,
}

/// POST /api/login - Authenticate and receive a JWT
///
/// Expected Input:
/// ```json
/// { "email": "a@x.com", "password": "pw123" }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "eyJhbGciOiJIUzI1NiI...",
///     "expires_at": 1767225600,
///     "expires_in": 259200,
///     "user": { "id": "user_uuid", "role": "user" }
///   }
/// }
/// ```
///
/// Unknown email and wrong password both answer `401 Invalid credentials`.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let identity = state
        .verifier
        .verify_login(email, &payload.password)
        .await
        .map_err(|e| match e {
            AuthError::NotFound(_) | AuthError::InvalidCredentials => {
                ApiError::unauthorized("Invalid credentials")
            }
            other => other.into(),
        })?;

    let issued = state.issuer.issue(&identity)?;
    info!("Issued session token for {}", identity.id);

    Ok(ApiResponse::success(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        expires_in: issued.expires_in,
        user: LoginUser {
            id: identity.id,
            role: identity.role.as_str().to_string(),
        },
    }))
}
