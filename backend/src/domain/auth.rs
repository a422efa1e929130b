//! Login credentials and the identity produced by a successful login.
//!
//! Payload parsing stays in the inbound adapter; these constructors validate
//! the raw strings before any port is consulted.

use zeroize::Zeroizing;

use super::{Caller, Role, UserId};

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `username` is trimmed and must not be empty after trimming.
/// - `password` must be non-empty; surrounding whitespace is kept.
///
/// # Examples
/// ```
/// use schoollib::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" student ", "password").unwrap();
/// assert_eq!(creds.username(), "student");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username string suitable for account lookups.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Identity returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The member's id.
    pub user_id: UserId,
    /// The member's role.
    pub role: Role,
}

impl From<AuthenticatedUser> for Caller {
    fn from(value: AuthenticatedUser) -> Self {
        Caller::new(value.user_id, value.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyUsername)]
    #[case("   ", "pw", LoginValidationError::EmptyUsername)]
    #[case("teacher", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(username, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn password_whitespace_is_kept() {
        let creds = LoginCredentials::try_from_parts("admin", " secret ").expect("valid");
        assert_eq!(creds.password(), " secret ");
    }

    #[rstest]
    fn authenticated_user_becomes_caller() {
        let user_id = UserId::random();
        let caller: Caller = AuthenticatedUser {
            user_id: user_id.clone(),
            role: Role::Admin,
        }
        .into();
        assert_eq!(caller.user_id(), &user_id);
        assert_eq!(caller.role(), Role::Admin);
    }
}
