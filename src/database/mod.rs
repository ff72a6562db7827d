// database/mod.rs - Store interfaces consumed by the authorization core
//
// The pipeline only ever reads through `CredentialStore` and `OwnershipStore`.
// `memory::MemoryStore` is the bundled implementation used by the server and tests.

pub mod memory;
pub mod models;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryStore;
pub use models::{Account, AccountUpdate, Role, Todo};

/// Errors raised by a backing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Account lookup used by login verification.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find an account by its login identifier (email). `Ok(None)` when absent.
    async fn find_account_by_identifier(&self, identifier: &str) -> Result<Option<Account>, StoreError>;
}

/// Owner lookup used by the ownership guard.
#[async_trait]
pub trait OwnershipStore: Send + Sync {
    /// Owner identity of a resource. `Ok(None)` when the resource does not exist.
    async fn find_resource_owner(&self, resource_id: &str) -> Result<Option<String>, StoreError>;
}
