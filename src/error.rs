// HTTP API Error Types
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::time::Duration;

use crate::auth::AuthError;
use crate::database::StoreError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 429 Too Many Requests
    TooManyRequests { message: String, retry_after: Duration },

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::TooManyRequests { message, .. } => message,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::TooManyRequests { .. } => "TOO_MANY_REQUESTS",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        });
        if let ApiError::TooManyRequests { retry_after, .. } = self {
            body["retry_after_seconds"] = json!(retry_after_secs(*retry_after));
        }
        body
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn too_many_requests(retry_after: Duration) -> Self {
        ApiError::TooManyRequests {
            message: "Too many requests. Please slow down.".to_string(),
            retry_after,
        }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

/// Round up so clients never retry early.
fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs();
    if retry_after.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid credentials"),
            // Rejection reasons stay in the logs; every caller sees the same message.
            AuthError::Unauthorized(_) => ApiError::unauthorized("Missing or invalid token"),
            AuthError::Forbidden => ApiError::forbidden("You are not allowed to modify this resource"),
            AuthError::NotFound(what) => ApiError::not_found(format!("{} not found", what)),
            AuthError::TooManyRequests { retry_after } => ApiError::too_many_requests(retry_after),
            AuthError::StoreTimeout(_) => {
                ApiError::service_unavailable("Store temporarily unavailable")
            }
            AuthError::Store(e) => e.into(),
            AuthError::Internal(msg) => {
                tracing::error!("Internal authorization error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::not_found(format!("{} not found", what)),
            StoreError::Conflict(msg) => ApiError::conflict(msg),
            StoreError::Unavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                ApiError::service_unavailable("Store temporarily unavailable")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let mut response = (self.status_code(), Json(self.to_json())).into_response();
        if let ApiError::TooManyRequests { retry_after, .. } = &self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs(*retry_after).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenRejection;

    #[test]
    fn token_rejections_collapse_to_one_message() {
        let expired: ApiError = AuthError::Unauthorized(TokenRejection::Expired).into();
        let forged: ApiError = AuthError::Unauthorized(TokenRejection::BadSignature).into();

        assert_eq!(expired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(expired.to_json(), forged.to_json());
    }

    #[test]
    fn too_many_requests_sets_retry_after() {
        let err: ApiError = AuthError::TooManyRequests {
            retry_after: Duration::from_millis(1500),
        }
        .into();
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
    }

    #[test]
    fn error_envelope_shape() {
        let body = ApiError::forbidden("nope").to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "nope");
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[test]
    fn store_timeout_is_service_unavailable() {
        let err: ApiError = AuthError::StoreTimeout(Duration::from_secs(5)).into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
