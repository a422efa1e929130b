//! PostgreSQL-backed circulation store.
//!
//! Every borrow or return runs in one database transaction on a connection
//! owned by the transaction handle. The contention points are settled by
//! PostgreSQL:
//!
//! - the stock gate is a single `UPDATE ... WHERE available_copies > 0`;
//! - a return locks the loan row (`FOR UPDATE`) and flips the status with an
//!   `UPDATE ... WHERE status = 'active'`;
//! - the partial unique index `loans_one_active_per_user_title` rejects a
//!   second active loan for the same user and title.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel_async::pooled_connection::bb8::PooledConnection;
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, RunQueryDsl, TransactionManager};

use crate::domain::ports::{CirculationStore, CirculationStoreError, CirculationTransaction};
use crate::domain::{Loan, LoanId, LoanStatus, TitleId, UserId};

use super::diesel_basic_error_mapping::{
    is_foreign_key_violation, is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{LoanRow, NewLoanRow};
use super::pool::{DbPool, PoolError};
use super::schema::{loans, titles};

/// Name of the partial unique index guarding active loans.
pub(crate) const ACTIVE_LOAN_INDEX: &str = "loans_one_active_per_user_title";

diesel::define_sql_function! {
    /// SQL `LEAST` over two integers.
    fn least(a: Integer, b: Integer) -> Integer;
}

/// Diesel-backed implementation of the circulation store.
#[derive(Clone)]
pub struct DieselCirculationStore {
    pool: DbPool,
}

impl DieselCirculationStore {
    /// Create a new store with the given connection pool.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use schoollib::outbound::persistence::{DbPool, DieselCirculationStore, PoolConfig};
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let pool = DbPool::new(PoolConfig::new("postgres://localhost/library")).await?;
    /// let store = DieselCirculationStore::new(pool);
    /// # let _ = store;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CirculationStoreError {
    map_basic_pool_error(error, CirculationStoreError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CirculationStoreError {
    map_basic_diesel_error(
        error,
        CirculationStoreError::query,
        CirculationStoreError::connection,
    )
}

fn rows_into_loans(rows: Vec<LoanRow>) -> Result<Vec<Loan>, CirculationStoreError> {
    rows.into_iter()
        .map(|row| row.into_domain().map_err(CirculationStoreError::query))
        .collect()
}

fn affected(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}

#[async_trait]
impl CirculationStore for DieselCirculationStore {
    async fn begin(&self) -> Result<Box<dyn CirculationTransaction>, CirculationStoreError> {
        let mut conn = self.pool.get_owned().await.map_err(map_pool_error)?;
        AnsiTransactionManager::begin_transaction(&mut *conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(Box::new(DieselCirculationTransaction { conn }))
    }

    async fn list_loans_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Loan>, CirculationStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<LoanRow> = loans::table
            .filter(loans::user_id.eq(user_id.as_uuid()))
            .order((loans::borrowed_at.asc(), loans::id.asc()))
            .select(LoanRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_into_loans(rows)
    }

    async fn list_all_loans(&self) -> Result<Vec<Loan>, CirculationStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<LoanRow> = loans::table
            .order((loans::borrowed_at.asc(), loans::id.asc()))
            .select(LoanRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows_into_loans(rows)
    }
}

/// Open database transaction on an owned pooled connection.
///
/// Dropping the handle without committing leaves the connection inside a
/// transaction; the pool treats such connections as broken and discards
/// them, which rolls the transaction back.
struct DieselCirculationTransaction {
    conn: PooledConnection<'static, AsyncPgConnection>,
}

#[async_trait]
impl CirculationTransaction for DieselCirculationTransaction {
    async fn find_active_loan(
        &mut self,
        user_id: &UserId,
        title_id: TitleId,
    ) -> Result<Option<Loan>, CirculationStoreError> {
        let row: Option<LoanRow> = loans::table
            .filter(loans::user_id.eq(user_id.as_uuid()))
            .filter(loans::title_id.eq(title_id.as_uuid()))
            .filter(loans::status.eq(LoanStatus::Active.as_str()))
            .select(LoanRow::as_select())
            .first(&mut *self.conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| row.into_domain().map_err(CirculationStoreError::query))
            .transpose()
    }

    async fn decrement_if_available(
        &mut self,
        title_id: TitleId,
    ) -> Result<u64, CirculationStoreError> {
        let rows = diesel::update(
            titles::table
                .filter(titles::id.eq(title_id.as_uuid()))
                .filter(titles::available_copies.gt(0)),
        )
        .set(titles::available_copies.eq(titles::available_copies - 1))
        .execute(&mut *self.conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(affected(rows))
    }

    async fn increment(&mut self, title_id: TitleId) -> Result<(), CirculationStoreError> {
        let rows = diesel::update(titles::table.filter(titles::id.eq(title_id.as_uuid())))
            // Adds at most the headroom below the total. Never computes
            // `available + 1`, which overflows when both sit at `i32::MAX`.
            .set(
                titles::available_copies.eq(
                    titles::available_copies
                        + least(1, titles::total_copies - titles::available_copies),
                ),
            )
            .execute(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        if rows == 0 {
            return Err(CirculationStoreError::query(format!(
                "title {title_id} missing during return"
            )));
        }
        Ok(())
    }

    async fn insert_loan(&mut self, loan: &Loan) -> Result<(), CirculationStoreError> {
        diesel::insert_into(loans::table)
            .values(NewLoanRow::from(loan))
            .execute(&mut *self.conn)
            .await
            .map_err(|err| {
                if is_unique_violation(&err, ACTIVE_LOAN_INDEX) {
                    CirculationStoreError::DuplicateActiveLoan
                } else if is_foreign_key_violation(&err) {
                    CirculationStoreError::query(format!(
                        "title {} does not exist",
                        loan.title_id()
                    ))
                } else {
                    map_diesel_error(err)
                }
            })?;
        Ok(())
    }

    async fn find_loan_for_update(
        &mut self,
        loan_id: LoanId,
    ) -> Result<Option<Loan>, CirculationStoreError> {
        let row: Option<LoanRow> = loans::table
            .find(loan_id.as_uuid())
            .select(LoanRow::as_select())
            .for_update()
            .first(&mut *self.conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(|row| row.into_domain().map_err(CirculationStoreError::query))
            .transpose()
    }

    async fn mark_returned(
        &mut self,
        loan_id: LoanId,
        returned_at: DateTime<Utc>,
    ) -> Result<u64, CirculationStoreError> {
        let rows = diesel::update(
            loans::table
                .filter(loans::id.eq(loan_id.as_uuid()))
                .filter(loans::status.eq(LoanStatus::Active.as_str())),
        )
        .set((
            loans::status.eq(LoanStatus::Returned.as_str()),
            loans::returned_at.eq(Some(returned_at)),
        ))
        .execute(&mut *self.conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(affected(rows))
    }

    async fn commit(mut self: Box<Self>) -> Result<(), CirculationStoreError> {
        AnsiTransactionManager::commit_transaction(&mut *self.conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), CirculationStoreError> {
        AnsiTransactionManager::rollback_transaction(&mut *self.conn)
            .await
            .map_err(map_diesel_error)
    }
}
