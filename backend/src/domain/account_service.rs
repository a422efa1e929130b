//! Member accounts domain service: registration and password login.
//!
//! Implements [`LoginService`] and [`RegistrationCommand`] over a
//! [`UserRepository`]. Username uniqueness is enforced by the repository so
//! two concurrent registrations of one name cannot both succeed.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{LoginService, RegistrationCommand, UserRepository, UserRepositoryError};
use crate::domain::{AuthenticatedUser, Error, LoginCredentials, Registration, UserAccount};

/// Account service implementing login and registration.
#[derive(Clone)]
pub struct AccountService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> AccountService<R> {
    /// Create a new service over the given repository.
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

impl<R> AccountService<R>
where
    R: UserRepository,
{
    fn map_repository_error(error: UserRepositoryError) -> Error {
        match error {
            UserRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserRepositoryError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserRepositoryError::DuplicateUsername { username } => {
                Error::conflict(format!("username {username} is already taken")).with_details(
                    json!({
                        "field": "username",
                        "code": "username_taken",
                    }),
                )
            }
        }
    }

    /// Store the built-in accounts that are not present yet.
    ///
    /// Returns how many were inserted; accounts whose username already
    /// exists are left untouched.
    pub async fn seed_fixture_accounts(&self) -> Result<usize, Error> {
        let accounts = UserAccount::fixtures(self.clock.utc())
            .map_err(|err| Error::internal(format!("invalid seed account: {err}")))?;
        let mut inserted = 0;
        for account in accounts {
            match self.repository.insert(&account).await {
                Ok(()) => inserted += 1,
                Err(UserRepositoryError::DuplicateUsername { username }) => {
                    debug!(%username, "seed account already present");
                }
                Err(other) => return Err(Self::map_repository_error(other)),
            }
        }
        Ok(inserted)
    }
}

#[async_trait]
impl<R> LoginService for AccountService<R>
where
    R: UserRepository,
{
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<AuthenticatedUser, Error> {
        let account = self
            .repository
            .find_by_username(credentials.username())
            .await
            .map_err(Self::map_repository_error)?;
        account
            .filter(|account| account.password_hash().verify(credentials.password()))
            .map(|account| AuthenticatedUser {
                user_id: account.id().clone(),
                role: account.role(),
            })
            .ok_or_else(|| Error::unauthorized("invalid credentials"))
    }
}

#[async_trait]
impl<R> RegistrationCommand for AccountService<R>
where
    R: UserRepository,
{
    async fn register(&self, registration: Registration) -> Result<UserAccount, Error> {
        let account = registration.into_account(self.clock.utc());
        self.repository
            .insert(&account)
            .await
            .map_err(Self::map_repository_error)?;
        info!(
            user_id = %account.id(),
            username = %account.username(),
            role = %account.role(),
            "account registered"
        );
        Ok(account)
    }
}
