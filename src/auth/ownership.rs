use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::{with_deadline, AuthError};
use crate::database::OwnershipStore;

/// Confirms the acting identity owns the resource it is about to mutate.
///
/// Ownership is read from the store on every call; nothing is cached between
/// requests.
pub struct OwnershipGuard {
    store: Arc<dyn OwnershipStore>,
    timeout: Duration,
}

impl OwnershipGuard {
    pub fn new(store: Arc<dyn OwnershipStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// `NotFound` when the resource is absent, `Forbidden` when someone else owns it.
    pub async fn check(&self, resource_id: &str, identity_id: &str) -> Result<(), AuthError> {
        let owner = with_deadline(self.timeout, self.store.find_resource_owner(resource_id))
            .await?
            .ok_or_else(|| AuthError::NotFound(format!("todo {}", resource_id)))?;

        if owner != identity_id {
            warn!("Ownership check failed: {} attempted to modify {}", identity_id, resource_id);
            return Err(AuthError::Forbidden);
        }
        Ok(())
    }
}
