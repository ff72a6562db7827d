use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use super::{with_deadline, AuthError, Identity};
use crate::config::ConfigError;
use crate::database::CredentialStore;

/// Checks login attempts against stored bcrypt hashes
pub struct CredentialVerifier {
    store: Arc<dyn CredentialStore>,
    timeout: Duration,
    /// Compared against when the identifier is unknown, so both failure
    /// paths pay for one bcrypt verification.
    decoy_hash: String,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn CredentialStore>, timeout: Duration, cost: u32) -> Result<Self, ConfigError> {
        let decoy_hash = bcrypt::hash("decoy-password", cost).map_err(|_| ConfigError::InvalidValue {
            name: "SECURITY_BCRYPT_COST",
            value: cost.to_string(),
        })?;
        Ok(Self {
            store,
            timeout,
            decoy_hash,
        })
    }

    /// Verify `secret` for the account registered under `identifier`.
    ///
    /// Returns `NotFound` for unknown identifiers and `InvalidCredentials` on
    /// a hash mismatch. The login handler reports both the same way.
    pub async fn verify_login(&self, identifier: &str, secret: &str) -> Result<Identity, AuthError> {
        let account = with_deadline(self.timeout, self.store.find_account_by_identifier(identifier)).await?;

        match account {
            None => {
                let _ = check_password(secret, &self.decoy_hash).await;
                debug!("Login failed: unknown identifier");
                Err(AuthError::NotFound("account".to_string()))
            }
            Some(account) => {
                if check_password(secret, &account.password_hash).await? {
                    Ok(Identity::from(&account))
                } else {
                    debug!("Login failed: password mismatch for {}", account.id);
                    Err(AuthError::InvalidCredentials)
                }
            }
        }
    }
}

/// Hash a password on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::Internal(format!("hashing task failed: {}", e)))?
        .map_err(|e| AuthError::Internal(format!("password hashing failed: {}", e)))
}

/// Compare a password with a stored hash on the blocking pool. A corrupt
/// stored hash counts as a mismatch.
pub async fn check_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hash = hash.to_string();
    let verdict = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Internal(format!("verification task failed: {}", e)))?;

    match verdict {
        Ok(matches) => Ok(matches),
        Err(e) => {
            error!("Stored password hash could not be parsed: {}", e);
            Ok(false)
        }
    }
}
