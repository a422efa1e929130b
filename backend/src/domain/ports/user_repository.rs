//! Driven port for member account persistence.

use async_trait::async_trait;

use crate::domain::UserAccount;

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the username.
        DuplicateUsername { username: String } => "username {username} is already taken",
    }
}

/// Port for storing and looking up member accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new account. Usernames are unique.
    async fn insert(&self, account: &UserAccount) -> Result<(), UserRepositoryError>;

    /// Look an account up by its exact username.
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, UserRepositoryError>;
}
