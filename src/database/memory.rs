use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::models::{Account, AccountUpdate, Role, Todo};
use super::{CredentialStore, OwnershipStore, StoreError};

#[derive(Default)]
struct Tables {
    accounts: HashMap<String, Account>,
    todos: HashMap<String, Todo>,
}

/// In-process account and todo store
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new account. Emails are unique, compared case-insensitively.
    pub async fn insert_account(
        &self,
        email: &str,
        username: &str,
        role: Role,
        password_hash: String,
    ) -> Result<Account, StoreError> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .accounts
            .values()
            .any(|a| a.email.eq_ignore_ascii_case(email));
        if taken {
            return Err(StoreError::Conflict(format!("email '{}' is already registered", email)));
        }

        let account = Account {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            username: username.to_string(),
            role,
            password_hash,
            created_at: Utc::now(),
        };
        tables.accounts.insert(account.id.clone(), account.clone());

        info!("Created {} account {}", account.role, account.id);
        Ok(account)
    }

    pub async fn find_account_by_id(&self, id: &str) -> Option<Account> {
        self.tables.read().await.accounts.get(id).cloned()
    }

    pub async fn list_accounts(&self) -> Vec<Account> {
        let tables = self.tables.read().await;
        let mut accounts: Vec<Account> = tables.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        accounts
    }

    pub async fn update_password(&self, id: &str, password_hash: String) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let account = tables
            .accounts
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;
        account.password_hash = password_hash;
        Ok(())
    }

    /// Apply a profile update. A new email must not collide with another account.
    pub async fn update_account(&self, id: &str, update: AccountUpdate) -> Result<Account, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.accounts.contains_key(id) {
            return Err(StoreError::NotFound(format!("user {}", id)));
        }
        if let Some(email) = update.email.as_deref() {
            let taken = tables
                .accounts
                .values()
                .any(|a| a.id != id && a.email.eq_ignore_ascii_case(email));
            if taken {
                return Err(StoreError::Conflict(format!("email '{}' is already registered", email)));
            }
        }

        let account = tables
            .accounts
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;
        if let Some(email) = update.email {
            account.email = email;
        }
        if let Some(username) = update.username {
            account.username = username;
        }
        if let Some(role) = update.role {
            account.role = role;
        }
        Ok(account.clone())
    }

    /// Remove an account together with every todo it owns. Returns how many
    /// todos went with it.
    pub async fn delete_account(&self, id: &str) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .accounts
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;

        let before = tables.todos.len();
        tables.todos.retain(|_, t| t.owner_id != id);
        let removed = before - tables.todos.len();

        info!("Deleted account {} and {} owned todos", id, removed);
        Ok(removed)
    }

    /// Insert a todo owned by `owner_id`, which must name an existing account.
    pub async fn insert_todo(&self, owner_id: &str, title: &str) -> Result<Todo, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.accounts.contains_key(owner_id) {
            return Err(StoreError::NotFound(format!("user {}", owner_id)));
        }

        let todo = Todo {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            completed: false,
            created_at: Utc::now(),
        };
        tables.todos.insert(todo.id.clone(), todo.clone());
        Ok(todo)
    }

    pub async fn get_todo(&self, id: &str) -> Option<Todo> {
        self.tables.read().await.todos.get(id).cloned()
    }

    pub async fn list_todos_by_owner(&self, owner_id: &str) -> Vec<Todo> {
        let tables = self.tables.read().await;
        let mut todos: Vec<Todo> = tables
            .todos
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        todos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        todos
    }

    pub async fn count_todos_by_owner(&self, owner_id: &str) -> usize {
        let tables = self.tables.read().await;
        tables.todos.values().filter(|t| t.owner_id == owner_id).count()
    }

    /// Apply a partial update. `owner_id` is never touched.
    pub async fn update_todo(
        &self,
        id: &str,
        title: Option<String>,
        completed: Option<bool>,
    ) -> Result<Todo, StoreError> {
        let mut tables = self.tables.write().await;
        let todo = tables
            .todos
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("todo {}", id)))?;
        if let Some(title) = title {
            todo.title = title;
        }
        if let Some(completed) = completed {
            todo.completed = completed;
        }
        Ok(todo.clone())
    }

    pub async fn delete_todo(&self, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .todos
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("todo {}", id)))
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_account_by_identifier(&self, identifier: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .find(|a| a.email.eq_ignore_ascii_case(identifier.trim()))
            .cloned())
    }
}

#[async_trait]
impl OwnershipStore for MemoryStore {
    async fn find_resource_owner(&self, resource_id: &str) -> Result<Option<String>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.todos.get(resource_id).map(|t| t.owner_id.clone()))
    }
}
