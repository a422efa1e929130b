//! In-process member accounts keyed by username.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::UserAccount;
use crate::domain::ports::{UserRepository, UserRepositoryError};

/// Shared in-memory account table.
///
/// Cloning yields another handle onto the same accounts.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use schoollib::domain::UserAccount;
/// use schoollib::outbound::memory::InMemoryUsers;
///
/// let seeded = UserAccount::fixtures(Utc::now()).unwrap();
/// let users = InMemoryUsers::with_accounts(seeded);
/// # let _ = users;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryUsers {
    accounts: Arc<Mutex<HashMap<String, UserAccount>>>,
}

impl InMemoryUsers {
    /// Create an empty account table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table holding `accounts`; later duplicates of a username are
    /// ignored.
    pub fn with_accounts(accounts: impl IntoIterator<Item = UserAccount>) -> Self {
        let mut table = HashMap::new();
        for account in accounts {
            table
                .entry(account.username().to_string())
                .or_insert(account);
        }
        Self {
            accounts: Arc::new(Mutex::new(table)),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUsers {
    async fn insert(&self, account: &UserAccount) -> Result<(), UserRepositoryError> {
        let mut accounts = self.accounts.lock().await;
        let username = account.username().to_string();
        if accounts.contains_key(&username) {
            return Err(UserRepositoryError::duplicate_username(username));
        }
        accounts.insert(username, account.clone());
        Ok(())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, UserRepositoryError> {
        Ok(self.accounts.lock().await.get(username).cloned())
    }
}
