//! Circulation engine: borrow, return and loan listings.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, error, info, warn};

use crate::domain::ports::{
    BorrowRequest, CirculationCommand, CirculationQuery, CirculationStore, CirculationStoreError,
    CirculationTransaction, ReturnRequest,
};
use crate::domain::{Caller, Loan, LoanId, LoanPeriod, LoanStatus, TitleId, UserId};

use super::CirculationError;

/// Circulation engine backed by a [`CirculationStore`].
///
/// Holds no locks of its own; every guard on stock and loan state is a
/// storage-level conditional write evaluated inside the transaction.
#[derive(Clone)]
pub struct CirculationService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    loan_period: LoanPeriod,
}

impl<S> CirculationService<S> {
    /// Create a new engine.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use schoollib::domain::{CirculationService, LoanPeriod};
    /// use schoollib::outbound::memory::InMemoryLibrary;
    ///
    /// let service = CirculationService::new(
    ///     Arc::new(InMemoryLibrary::new()),
    ///     Arc::new(DefaultClock),
    ///     LoanPeriod::default(),
    /// );
    /// # let _ = service;
    /// ```
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, loan_period: LoanPeriod) -> Self {
        Self {
            store,
            clock,
            loan_period,
        }
    }
}

impl<S> CirculationService<S>
where
    S: CirculationStore,
{
    async fn borrow_within(
        &self,
        tx: &mut dyn CirculationTransaction,
        user_id: &UserId,
        title_id: TitleId,
    ) -> Result<Loan, CirculationError> {
        if tx.find_active_loan(user_id, title_id).await?.is_some() {
            return Err(CirculationError::AlreadyBorrowed { title_id });
        }

        if tx.decrement_if_available(title_id).await? == 0 {
            return Err(CirculationError::StockInsufficient { title_id });
        }

        let loan = Loan::open(user_id.clone(), title_id, self.clock.utc(), self.loan_period);
        match tx.insert_loan(&loan).await {
            Ok(()) => Ok(loan),
            // A concurrent borrow of the same title by the same user won.
            Err(CirculationStoreError::DuplicateActiveLoan) => {
                Err(CirculationError::AlreadyBorrowed { title_id })
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn return_within(
        &self,
        tx: &mut dyn CirculationTransaction,
        user_id: &UserId,
        loan_id: LoanId,
    ) -> Result<Loan, CirculationError> {
        let mut loan = tx
            .find_loan_for_update(loan_id)
            .await?
            .ok_or(CirculationError::LoanNotFound { loan_id })?;

        if loan.user_id() != user_id {
            return Err(CirculationError::NotOwner { loan_id });
        }

        let returned_at = self.clock.utc();
        loan.mark_returned(returned_at)
            .map_err(|err| CirculationError::InvalidReturnState {
                loan_id,
                status: err.status,
            })?;

        if tx.mark_returned(loan_id, returned_at).await? == 0 {
            return Err(CirculationError::InvalidReturnState {
                loan_id,
                status: LoanStatus::Returned,
            });
        }

        tx.increment(loan.title_id()).await?;
        Ok(loan)
    }
}

async fn finish<T>(
    tx: Box<dyn CirculationTransaction>,
    outcome: Result<T, CirculationError>,
) -> Result<T, CirculationError> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "circulation rollback failed");
            }
            Err(err)
        }
    }
}

fn log_failure(operation: &'static str, caller: &Caller, err: &CirculationError) {
    match err {
        CirculationError::Store(store_err) => error!(
            operation,
            user_id = %caller.user_id(),
            error = %store_err,
            "circulation store failure"
        ),
        rejected => debug!(
            operation,
            user_id = %caller.user_id(),
            reason = rejected.kind(),
            "circulation request rejected"
        ),
    }
}

#[async_trait]
impl<S> CirculationCommand for CirculationService<S>
where
    S: CirculationStore,
{
    async fn borrow(
        &self,
        caller: &Caller,
        request: BorrowRequest,
    ) -> Result<Loan, CirculationError> {
        let BorrowRequest { title_id } = request;
        let result = async {
            let mut tx = self.store.begin().await?;
            let outcome = self.borrow_within(tx.as_mut(), caller.user_id(), title_id).await;
            finish(tx, outcome).await
        }
        .await;

        match &result {
            Ok(loan) => info!(
                user_id = %caller.user_id(),
                title_id = %title_id,
                loan_id = %loan.id(),
                "title borrowed"
            ),
            Err(err) => log_failure("borrow", caller, err),
        }
        result
    }

    async fn return_loan(
        &self,
        caller: &Caller,
        request: ReturnRequest,
    ) -> Result<Loan, CirculationError> {
        let ReturnRequest { loan_id } = request;
        let result = async {
            let mut tx = self.store.begin().await?;
            let outcome = self.return_within(tx.as_mut(), caller.user_id(), loan_id).await;
            finish(tx, outcome).await
        }
        .await;

        match &result {
            Ok(loan) => info!(
                user_id = %caller.user_id(),
                title_id = %loan.title_id(),
                loan_id = %loan_id,
                "loan returned"
            ),
            Err(err) => log_failure("return", caller, err),
        }
        result
    }
}

#[async_trait]
impl<S> CirculationQuery for CirculationService<S>
where
    S: CirculationStore,
{
    async fn list_by_user(&self, caller: &Caller) -> Result<Vec<Loan>, CirculationError> {
        self.store
            .list_loans_for_user(caller.user_id())
            .await
            .map_err(|err| {
                let err = CirculationError::from(err);
                log_failure("list_by_user", caller, &err);
                err
            })
    }

    async fn list_all(&self, caller: &Caller) -> Result<Vec<Loan>, CirculationError> {
        self.store.list_all_loans().await.map_err(|err| {
            let err = CirculationError::from(err);
            log_failure("list_all", caller, &err);
            err
        })
    }
}
