use std::time::Duration;
use thiserror::Error;

use crate::database::StoreError;

/// Why a presented token was refused. Callers only ever see `401`; the
/// reason is kept for logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenRejection {
    #[error("missing token")]
    Missing,

    #[error("malformed token")]
    Malformed,

    #[error("signature mismatch")]
    BadSignature,

    #[error("unexpected signing algorithm")]
    WrongAlgorithm,

    #[error("token expired")]
    Expired,

    #[error("missing required claim '{0}'")]
    MissingClaim(&'static str),
}

/// Per-request authorization failures
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(TokenRejection),

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests { retry_after: Duration },

    #[error("Store call timed out after {0:?}")]
    StoreTimeout(Duration),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TokenRejection> for AuthError {
    fn from(reason: TokenRejection) -> Self {
        AuthError::Unauthorized(reason)
    }
}
