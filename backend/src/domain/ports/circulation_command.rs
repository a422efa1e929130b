//! Driving ports for borrowing, returning and listing loans.
//!
//! Inbound adapters authorise the [`Caller`] first (see
//! [`crate::domain::access`]) and then call these ports. Implementations
//! trust the caller they are given.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Caller, CirculationError, Loan, LoanId, TitleId};

/// Request to borrow one copy of a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    /// Title to borrow.
    pub title_id: TitleId,
}

/// Request to return a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    /// Loan to close.
    pub loan_id: LoanId,
}

/// State-changing circulation use cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CirculationCommand: Send + Sync {
    /// Borrow a copy for the caller. All-or-nothing.
    async fn borrow(&self, caller: &Caller, request: BorrowRequest)
    -> Result<Loan, CirculationError>;

    /// Return one of the caller's active loans. Succeeds at most once per
    /// loan.
    async fn return_loan(
        &self,
        caller: &Caller,
        request: ReturnRequest,
    ) -> Result<Loan, CirculationError>;
}

/// Read-only circulation use cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CirculationQuery: Send + Sync {
    /// Every loan, in any status, held by the caller.
    async fn list_by_user(&self, caller: &Caller) -> Result<Vec<Loan>, CirculationError>;

    /// Every loan in the library. Callers must hold the admin capability.
    async fn list_all(&self, caller: &Caller) -> Result<Vec<Loan>, CirculationError>;
}
