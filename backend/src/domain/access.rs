//! Role-based capability checks performed before a use case runs.
//!
//! Inbound adapters resolve a [`Caller`] and call [`authorize`] with the
//! capability the endpoint needs. The circulation engine itself never looks
//! at roles.

use std::fmt;

use super::{Caller, Role};

/// Operations guarded by role checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Borrow a copy of a title.
    Borrow,
    /// Return one of the caller's own loans.
    Return,
    /// List the caller's own loans.
    ListOwnLoans,
    /// List every loan in the library.
    ListAllLoans,
    /// Create, edit or delete catalogue titles.
    ManageCatalogue,
    /// Read the catalogue.
    BrowseCatalogue,
    /// Open an account with the ADMIN role.
    RegisterAdmin,
}

impl Capability {
    /// Roles allowed to exercise this capability.
    pub const fn allowed_roles(self) -> &'static [Role] {
        const MEMBERS: &[Role] = &[Role::Student, Role::Teacher, Role::Admin];
        const ADMINS: &[Role] = &[Role::Admin];
        match self {
            Self::Borrow | Self::Return | Self::ListOwnLoans | Self::BrowseCatalogue => MEMBERS,
            Self::ListAllLoans | Self::ManageCatalogue | Self::RegisterAdmin => ADMINS,
        }
    }

    /// Stable snake_case name used in logs and error details.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Borrow => "borrow",
            Self::Return => "return",
            Self::ListOwnLoans => "list_own_loans",
            Self::ListAllLoans => "list_all_loans",
            Self::ManageCatalogue => "manage_catalogue",
            Self::BrowseCatalogue => "browse_catalogue",
            Self::RegisterAdmin => "register_admin",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a caller's role does not grant a capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("role {role} may not {capability}")]
pub struct AccessDenied {
    /// Role the caller presented.
    pub role: Role,
    /// Capability that was requested.
    pub capability: Capability,
}

/// Check that `caller` may exercise `capability`.
///
/// # Examples
/// ```
/// use schoollib::domain::access::{authorize, Capability};
/// use schoollib::domain::{Caller, Role, UserId};
///
/// let student = Caller::new(UserId::random(), Role::Student);
/// assert!(authorize(&student, Capability::Borrow).is_ok());
/// assert!(authorize(&student, Capability::ListAllLoans).is_err());
/// ```
pub fn authorize(caller: &Caller, capability: Capability) -> Result<(), AccessDenied> {
    if capability.allowed_roles().contains(&caller.role()) {
        Ok(())
    } else {
        Err(AccessDenied {
            role: caller.role(),
            capability,
        })
    }
}
