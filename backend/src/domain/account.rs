//! Member accounts: registration input, stored credentials and the built-in
//! seed accounts.
//!
//! Passwords never leave this module in clear text once a [`Registration`]
//! is turned into a [`UserAccount`]; only the salted digest is stored.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::{Uuid, uuid};
use zeroize::Zeroizing;

use super::{Role, UserId};

/// Inclusive username length bounds, counted in characters after trimming.
pub const USERNAME_LENGTH: (usize, usize) = (3, 20);
/// Inclusive password length bounds, counted in characters.
pub const PASSWORD_LENGTH: (usize, usize) = (6, 50);
/// Longest accepted contact string.
pub const CONTACT_MAX: usize = 100;

/// Password shared by the seed accounts.
pub const FIXTURE_PASSWORD: &str = "password";

/// Seed accounts present in every store: `(username, user id, role)`.
pub const FIXTURE_ACCOUNTS: [(&str, Uuid, Role); 3] = [
    (
        "student",
        uuid!("5b8e2a9c-1f0d-4c3e-9a7b-0d6f4e2c1a01"),
        Role::Student,
    ),
    (
        "teacher",
        uuid!("5b8e2a9c-1f0d-4c3e-9a7b-0d6f4e2c1a02"),
        Role::Teacher,
    ),
    (
        "admin",
        uuid!("5b8e2a9c-1f0d-4c3e-9a7b-0d6f4e2c1a03"),
        Role::Admin,
    ),
];

const HASH_SCHEME: &str = "sha256";
const HASH_ROUNDS: u32 = 4096;
const SALT_LEN: usize = 16;

/// Domain error returned when registration values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountValidationError {
    /// Username fell outside the allowed length once trimmed.
    #[error("username must be between 3 and 20 characters")]
    UsernameLength,
    /// Password fell outside the allowed length.
    #[error("password must be between 6 and 50 characters")]
    PasswordLength,
    /// Role was not one of STUDENT, TEACHER or ADMIN.
    #[error("unknown role: {0}")]
    UnknownRole(String),
    /// Contact string was too long.
    #[error("contact must be at most 100 characters")]
    ContactTooLong,
}

/// Login name, trimmed and length-checked.
///
/// # Examples
/// ```
/// use schoollib::domain::Username;
///
/// let name = Username::new("  ada ").unwrap();
/// assert_eq!(name.as_ref(), "ada");
/// assert!(Username::new("al").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Validate and normalise a username.
    pub fn new(raw: &str) -> Result<Self, AccountValidationError> {
        let trimmed = raw.trim();
        if !within(trimmed, USERNAME_LENGTH) {
            return Err(AccountValidationError::UsernameLength);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn within(value: &str, (min, max): (usize, usize)) -> bool {
    let len = value.chars().count();
    (min..=max).contains(&len)
}

/// Salted, iterated SHA-256 digest in the form
/// `sha256$<rounds>$<salt hex>$<digest hex>`.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash `password` under a fresh random salt.
    pub fn derive(password: &str) -> Self {
        let mut salt = [0_u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let digest = stretch(&salt, password, HASH_ROUNDS);
        Self(format!(
            "{HASH_SCHEME}${HASH_ROUNDS}${}${}",
            hex::encode(salt),
            hex::encode(digest)
        ))
    }

    /// Wrap a stored hash string. Malformed strings never verify.
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded form for storage.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Check `password` against the stored digest.
    pub fn verify(&self, password: &str) -> bool {
        let mut parts = self.0.split('$');
        let (Some(HASH_SCHEME), Some(rounds), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return false;
        };
        let (Ok(rounds), Ok(salt), Ok(expected)) =
            (rounds.parse::<u32>(), hex::decode(salt), hex::decode(expected))
        else {
            return false;
        };
        let actual = stretch(&salt, password, rounds);
        expected.len() == actual.len()
            && expected
                .iter()
                .zip(actual.iter())
                .fold(0_u8, |diff, (a, b)| diff | (a ^ b))
                == 0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

fn stretch(salt: &[u8], password: &str, rounds: u32) -> Vec<u8> {
    let mut digest = Sha256::new()
        .chain_update(salt)
        .chain_update(password.as_bytes())
        .finalize();
    for _ in 1..rounds {
        digest = Sha256::new()
            .chain_update(salt)
            .chain_update(digest)
            .finalize();
    }
    digest.to_vec()
}

/// Validated registration input.
///
/// ## Invariants
/// - `username` is trimmed and 3 to 20 characters long.
/// - `password` is 6 to 50 characters long; whitespace is kept.
/// - `contact` is trimmed; blank contacts become `None`.
///
/// # Examples
/// ```
/// use schoollib::domain::{Registration, Role};
///
/// let registration =
///     Registration::try_from_parts("ada", "secret1", "teacher", Some("room 4")).unwrap();
/// assert_eq!(registration.role(), Role::Teacher);
/// assert_eq!(registration.contact(), Some("room 4"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    username: Username,
    password: Zeroizing<String>,
    role: Role,
    contact: Option<String>,
}

impl Registration {
    /// Validate raw registration fields.
    pub fn try_from_parts(
        username: &str,
        password: &str,
        role: &str,
        contact: Option<&str>,
    ) -> Result<Self, AccountValidationError> {
        let username = Username::new(username)?;
        if !within(password, PASSWORD_LENGTH) {
            return Err(AccountValidationError::PasswordLength);
        }
        let role = role
            .parse::<Role>()
            .map_err(|_| AccountValidationError::UnknownRole(role.to_owned()))?;
        let contact = contact.map(str::trim).filter(|value| !value.is_empty());
        if contact.is_some_and(|value| value.chars().count() > CONTACT_MAX) {
            return Err(AccountValidationError::ContactTooLong);
        }
        Ok(Self {
            username,
            password: Zeroizing::new(password.to_owned()),
            role,
            contact: contact.map(str::to_owned),
        })
    }

    /// Requested login name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Requested role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Optional contact detail.
    pub fn contact(&self) -> Option<&str> {
        self.contact.as_deref()
    }

    /// Hash the password and mint a new account registered at `at`.
    pub fn into_account(self, at: DateTime<Utc>) -> UserAccount {
        UserAccount {
            id: UserId::random(),
            password_hash: PasswordHash::derive(&self.password),
            username: self.username,
            role: self.role,
            contact: self.contact,
            registered_at: at,
        }
    }
}

/// Stored member account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    id: UserId,
    username: Username,
    password_hash: PasswordHash,
    role: Role,
    contact: Option<String>,
    registered_at: DateTime<Utc>,
}

/// Stored account fields, used by persistence adapters to rebuild a
/// [`UserAccount`].
#[derive(Debug, Clone)]
pub struct UserAccountRecord {
    /// Identifier.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// Encoded password digest.
    pub password_hash: PasswordHash,
    /// Granted role.
    pub role: Role,
    /// Optional contact detail.
    pub contact: Option<String>,
    /// Registration timestamp.
    pub registered_at: DateTime<Utc>,
}

impl From<UserAccountRecord> for UserAccount {
    fn from(record: UserAccountRecord) -> Self {
        let UserAccountRecord {
            id,
            username,
            password_hash,
            role,
            contact,
            registered_at,
        } = record;
        Self {
            id,
            username,
            password_hash,
            role,
            contact,
            registered_at,
        }
    }
}

impl UserAccount {
    /// The built-in accounts, one per role, all using [`FIXTURE_PASSWORD`].
    pub fn fixtures(at: DateTime<Utc>) -> Result<Vec<Self>, AccountValidationError> {
        FIXTURE_ACCOUNTS
            .iter()
            .map(|(username, id, role)| {
                Ok(UserAccountRecord {
                    id: UserId::from_uuid(*id),
                    username: Username::new(username)?,
                    password_hash: PasswordHash::derive(FIXTURE_PASSWORD),
                    role: *role,
                    contact: None,
                    registered_at: at,
                }
                .into())
            })
            .collect()
    }

    /// Identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Login name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Stored digest.
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    /// Granted role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Optional contact detail.
    pub fn contact(&self) -> Option<&str> {
        self.contact.as_deref()
    }

    /// Registration timestamp.
    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }
}
