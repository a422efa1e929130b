//! Driving port for opening member accounts.

use async_trait::async_trait;

use crate::domain::{Error, Registration, UserAccount};

/// Account registration. Gating ADMIN registrations on the caller's role is
/// left to the inbound adapter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationCommand: Send + Sync {
    /// Create an account; fails with a conflict when the username is taken.
    async fn register(&self, registration: Registration) -> Result<UserAccount, Error>;
}
