//! Driven port for the inventory counters and the loan ledger.
//!
//! Borrow and return each run inside one [`CirculationTransaction`]. The
//! transaction exposes the storage primitives the circulation engine relies
//! on; contention on the available-copy counter and on the one-active-loan
//! rule is settled by the store (conditional writes, row locks and a unique
//! index), never by in-process locking in the engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Loan, LoanId, TitleId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by circulation store adapters.
    pub enum CirculationStoreError {
        /// The store could not be reached.
        Connection { message: String } =>
            "circulation store connection failed: {message}",
        /// A query or mutation failed during execution.
        Query { message: String } =>
            "circulation store query failed: {message}",
        /// A second active loan for the same user and title was rejected.
        DuplicateActiveLoan =>
            "an active loan already exists for this user and title",
    }
}

/// Entry point to the circulation store.
#[async_trait]
pub trait CirculationStore: Send + Sync {
    /// Open a transaction. Dropping the handle without committing rolls it
    /// back.
    async fn begin(&self) -> Result<Box<dyn CirculationTransaction>, CirculationStoreError>;

    /// Every loan held by `user_id`, in borrow order.
    async fn list_loans_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Loan>, CirculationStoreError>;

    /// Every loan in the ledger, in borrow order.
    async fn list_all_loans(&self) -> Result<Vec<Loan>, CirculationStoreError>;
}

/// Unit of work spanning the inventory counter and the loan ledger.
#[async_trait]
pub trait CirculationTransaction: Send {
    /// The active loan for `(user_id, title_id)`, if one exists.
    async fn find_active_loan(
        &mut self,
        user_id: &UserId,
        title_id: TitleId,
    ) -> Result<Option<Loan>, CirculationStoreError>;

    /// Decrement the available-copy counter only when it is above zero.
    ///
    /// Must be one indivisible conditional write. Returns the number of rows
    /// affected: `1` when a copy was taken, `0` when none was available or
    /// the title does not exist.
    async fn decrement_if_available(
        &mut self,
        title_id: TitleId,
    ) -> Result<u64, CirculationStoreError>;

    /// Increment the available-copy counter, bounded above by the total.
    async fn increment(&mut self, title_id: TitleId) -> Result<(), CirculationStoreError>;

    /// Persist a freshly opened loan.
    ///
    /// Fails with [`CirculationStoreError::DuplicateActiveLoan`] when another
    /// active loan for the same user and title already exists.
    async fn insert_loan(&mut self, loan: &Loan) -> Result<(), CirculationStoreError>;

    /// Read a loan and hold it against concurrent returns until the
    /// transaction ends.
    async fn find_loan_for_update(
        &mut self,
        loan_id: LoanId,
    ) -> Result<Option<Loan>, CirculationStoreError>;

    /// Move an active loan to returned. Conditional on the stored status
    /// still being active; returns the number of rows affected.
    async fn mark_returned(
        &mut self,
        loan_id: LoanId,
        returned_at: DateTime<Utc>,
    ) -> Result<u64, CirculationStoreError>;

    /// Make every write in this transaction durable.
    async fn commit(self: Box<Self>) -> Result<(), CirculationStoreError>;

    /// Discard every write in this transaction.
    async fn rollback(self: Box<Self>) -> Result<(), CirculationStoreError>;
}
