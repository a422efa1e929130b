//! Loan records and their one-shot lifecycle.
//!
//! A loan moves `ACTIVE -> RETURNED` exactly once and is never deleted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{TitleId, UserId};

/// Stable loan identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(Uuid);

impl LoanId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle state of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoanStatus {
    /// The copy is with the borrower.
    Active,
    /// The copy is back on the shelf.
    Returned,
}

impl LoanStatus {
    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Returned => "returned",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown loan status: {0}")]
pub struct UnknownLoanStatus(pub String);

impl FromStr for LoanStatus {
    type Err = UnknownLoanStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "returned" => Ok(Self::Returned),
            other => Err(UnknownLoanStatus(other.to_owned())),
        }
    }
}

/// Raised when a loan cannot be returned because it is not active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("loan {loan_id} is {status}, not active")]
pub struct NotActive {
    /// The loan concerned.
    pub loan_id: LoanId,
    /// Its current status.
    pub status: LoanStatus,
}

/// Length of a loan in whole days.
///
/// # Examples
/// ```
/// use schoollib::domain::LoanPeriod;
///
/// assert_eq!(LoanPeriod::default().days(), 30);
/// assert!(LoanPeriod::from_days(0).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanPeriod(u16);

impl LoanPeriod {
    /// Default lending period.
    pub const DEFAULT_DAYS: u16 = 30;

    /// Build a period; zero-length periods are rejected.
    pub const fn from_days(days: u16) -> Option<Self> {
        if days == 0 { None } else { Some(Self(days)) }
    }

    /// Number of days.
    pub const fn days(self) -> u16 {
        self.0
    }

    fn as_duration(self) -> Duration {
        Duration::days(i64::from(self.0))
    }
}

impl Default for LoanPeriod {
    fn default() -> Self {
        Self(Self::DEFAULT_DAYS)
    }
}

/// One borrower's hold on one copy of a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    id: LoanId,
    user_id: UserId,
    title_id: TitleId,
    status: LoanStatus,
    borrowed_at: DateTime<Utc>,
    due_at: DateTime<Utc>,
    returned_at: Option<DateTime<Utc>>,
}

/// Stored loan fields, used by persistence adapters to rebuild a [`Loan`].
#[derive(Debug, Clone)]
pub struct LoanRecord {
    /// Identifier.
    pub id: LoanId,
    /// Borrower.
    pub user_id: UserId,
    /// Borrowed title.
    pub title_id: TitleId,
    /// Lifecycle state.
    pub status: LoanStatus,
    /// Borrow timestamp.
    pub borrowed_at: DateTime<Utc>,
    /// Due timestamp.
    pub due_at: DateTime<Utc>,
    /// Return timestamp, set once returned.
    pub returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    /// Open a new active loan due one `period` after `borrowed_at`.
    pub fn open(
        user_id: UserId,
        title_id: TitleId,
        borrowed_at: DateTime<Utc>,
        period: LoanPeriod,
    ) -> Self {
        Self {
            id: LoanId::random(),
            user_id,
            title_id,
            status: LoanStatus::Active,
            borrowed_at,
            due_at: borrowed_at + period.as_duration(),
            returned_at: None,
        }
    }

    /// Close the loan. Fails unless the loan is active.
    pub fn mark_returned(&mut self, at: DateTime<Utc>) -> Result<(), NotActive> {
        if self.status != LoanStatus::Active {
            return Err(NotActive {
                loan_id: self.id,
                status: self.status,
            });
        }
        self.status = LoanStatus::Returned;
        self.returned_at = Some(at);
        Ok(())
    }

    /// Identifier.
    pub fn id(&self) -> LoanId {
        self.id
    }

    /// Borrower.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Borrowed title.
    pub fn title_id(&self) -> TitleId {
        self.title_id
    }

    /// Lifecycle state.
    pub fn status(&self) -> LoanStatus {
        self.status
    }

    /// Whether the loan is still active.
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    /// Borrow timestamp.
    pub fn borrowed_at(&self) -> DateTime<Utc> {
        self.borrowed_at
    }

    /// Due timestamp.
    pub fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    /// Return timestamp, if returned.
    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        self.returned_at
    }
}

impl From<LoanRecord> for Loan {
    fn from(record: LoanRecord) -> Self {
        let LoanRecord {
            id,
            user_id,
            title_id,
            status,
            borrowed_at,
            due_at,
            returned_at,
        } = record;
        Self {
            id,
            user_id,
            title_id,
            status,
            borrowed_at,
            due_at,
            returned_at,
        }
    }
}
