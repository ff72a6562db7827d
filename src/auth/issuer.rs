use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use tracing::debug;

use super::{AuthError, Claims, Identity, SIGNING_ALGORITHM};
use crate::config::ConfigError;

/// Encoded token handed back to the client at login
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    /// Absolute expiry, Unix seconds
    pub expires_at: i64,
    /// Seconds until expiry
    pub expires_in: i64,
}

/// Mints HS256 tokens for verified identities
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// An empty secret or a non-positive lifetime is a configuration fault,
    /// reported here rather than on the first login.
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, ConfigError> {
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        if ttl <= Duration::zero() {
            return Err(ConfigError::InvalidValue {
                name: "SECURITY_JWT_EXPIRY_HOURS",
                value: ttl.num_hours().to_string(),
            });
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, AuthError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Internal(format!("token lifetime {} overflows", self.ttl)))?
            .timestamp();
        let claims = Claims {
            identity_id: identity.id.clone(),
            role: identity.role.as_str().to_string(),
            exp: expires_at,
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("token encoding failed: {}", e)))?;

        debug!("Issued token for {} ({}), expires at {}", identity.id, identity.role, expires_at);

        Ok(IssuedToken {
            token,
            expires_at,
            expires_in: expires_at - now.timestamp(),
        })
    }
}
