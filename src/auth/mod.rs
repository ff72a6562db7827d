// auth/mod.rs - Request authorization core
//
// Credential verification, token issuance and validation, ownership checks and
// rate limiting. Nothing in here reads the process environment: secrets and
// limits are passed in at construction.

pub mod credentials;
pub mod error;
pub mod issuer;
pub mod ownership;
pub mod rate_limit;
pub mod validator;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::database::{Account, Role, StoreError};

pub use credentials::CredentialVerifier;
pub use error::{AuthError, TokenRejection};
pub use issuer::{IssuedToken, TokenIssuer};
pub use ownership::OwnershipGuard;
pub use rate_limit::{Admission, RateLimitRule, RateLimiter};
pub use validator::TokenValidator;

/// The only algorithm tokens are signed and accepted with.
pub const SIGNING_ALGORITHM: jsonwebtoken::Algorithm = jsonwebtoken::Algorithm::HS256;

/// Claims embedded in every issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub identity_id: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// A verified user, as produced by login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub role: Role,
}

impl From<&Account> for Identity {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            role: account.role,
        }
    }
}

/// Bound a store call by `timeout`.
pub(crate) async fn with_deadline<T, F>(timeout: Duration, call: F) -> Result<T, AuthError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(AuthError::from),
        Err(_) => {
            tracing::error!("Store call exceeded deadline of {:?}", timeout);
            Err(AuthError::StoreTimeout(timeout))
        }
    }
}
