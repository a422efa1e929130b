//! Typed failures of the circulation use cases.

use crate::domain::ports::CirculationStoreError;
use crate::domain::{LoanId, LoanStatus, TitleId};

/// Failure of a borrow, return or loan listing.
///
/// Every variant except [`CirculationError::Store`] is caused by the request
/// and leaves persisted state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CirculationError {
    /// The caller already holds an active loan of this title.
    #[error("title {title_id} is already borrowed by this user")]
    AlreadyBorrowed {
        /// Title requested.
        title_id: TitleId,
    },
    /// No copy of the title was available.
    #[error("no copies of title {title_id} are available")]
    StockInsufficient {
        /// Title requested.
        title_id: TitleId,
    },
    /// The loan does not exist.
    #[error("loan {loan_id} not found")]
    LoanNotFound {
        /// Loan requested.
        loan_id: LoanId,
    },
    /// The loan belongs to somebody else.
    #[error("loan {loan_id} belongs to another user")]
    NotOwner {
        /// Loan requested.
        loan_id: LoanId,
    },
    /// The loan is not active, so it cannot be returned.
    #[error("loan {loan_id} is {status} and cannot be returned")]
    InvalidReturnState {
        /// Loan requested.
        loan_id: LoanId,
        /// Status found in the ledger.
        status: LoanStatus,
    },
    /// The store failed; the transaction was rolled back.
    #[error(transparent)]
    Store(#[from] CirculationStoreError),
}

impl CirculationError {
    /// Stable snake_case identifier for the failure kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyBorrowed { .. } => "already_borrowed",
            Self::StockInsufficient { .. } => "stock_insufficient",
            Self::LoanNotFound { .. } => "loan_not_found",
            Self::NotOwner { .. } => "not_owner",
            Self::InvalidReturnState { .. } => "invalid_return_state",
            Self::Store(_) => "store_failure",
        }
    }
}
