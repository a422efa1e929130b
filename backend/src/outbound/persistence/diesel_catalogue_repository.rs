//! PostgreSQL-backed catalogue repository.
//!
//! Total-copy edits are one `UPDATE` whose `SET` clause shifts the available
//! counter by the raw delta and clamps it into `[0, new_total]`, so the
//! adjustment is atomic with respect to concurrent borrows and returns.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CatalogueRepository, CatalogueRepositoryError};
use crate::domain::{Title, TitleDetails, TitleId};

use super::diesel_basic_error_mapping::{
    is_foreign_key_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{NewTitleRow, TitleDetailsChangeset, TitleRow};
use super::pool::{DbPool, PoolError};
use super::schema::titles;

diesel::define_sql_function! {
    /// SQL `LEAST` over two integers.
    fn least(a: Integer, b: Integer) -> Integer;
}

diesel::define_sql_function! {
    /// SQL `GREATEST` over two integers.
    fn greatest(a: Integer, b: Integer) -> Integer;
}

/// Diesel-backed implementation of the catalogue repository.
#[derive(Clone)]
pub struct DieselCatalogueRepository {
    pool: DbPool,
}

impl DieselCatalogueRepository {
    /// Create a new repository with the given connection pool.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use schoollib::outbound::persistence::{DbPool, DieselCatalogueRepository, PoolConfig};
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let pool = DbPool::new(PoolConfig::new("postgres://localhost/library")).await?;
    /// let repository = DieselCatalogueRepository::new(pool);
    /// # let _ = repository;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CatalogueRepositoryError {
    map_basic_pool_error(error, CatalogueRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CatalogueRepositoryError {
    map_basic_diesel_error(
        error,
        CatalogueRepositoryError::query,
        CatalogueRepositoryError::connection,
    )
}

fn to_column(count: u32) -> Result<i32, CatalogueRepositoryError> {
    i32::try_from(count)
        .map_err(|_| CatalogueRepositoryError::query(format!("copy count {count} out of range")))
}

fn row_into_title(row: TitleRow) -> Result<Title, CatalogueRepositoryError> {
    row.into_domain().map_err(CatalogueRepositoryError::query)
}

#[async_trait]
impl CatalogueRepository for DieselCatalogueRepository {
    async fn insert(&self, title: &Title) -> Result<(), CatalogueRepositoryError> {
        let details = title.details();
        let row = NewTitleRow {
            id: *title.id().as_uuid(),
            name: details.name(),
            author: details.author(),
            publisher: details.publisher(),
            isbn: details.isbn(),
            category: details.category(),
            total_copies: to_column(title.copies().total())?,
            available_copies: to_column(title.copies().available())?,
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(titles::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        title_id: TitleId,
    ) -> Result<Option<Title>, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<TitleRow> = titles::table
            .find(title_id.as_uuid())
            .select(TitleRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_into_title).transpose()
    }

    async fn list(&self) -> Result<Vec<Title>, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<TitleRow> = titles::table
            .order((titles::name.asc(), titles::id.asc()))
            .select(TitleRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_into_title).collect()
    }

    async fn update(
        &self,
        title_id: TitleId,
        details: &TitleDetails,
        new_total: u32,
    ) -> Result<Option<Title>, CatalogueRepositoryError> {
        let new_total = to_column(new_total)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // The right-hand sides read the pre-update row, so the delta is
        // computed against the stored total. `available - total` is never
        // positive, so subtracting first keeps the sum inside INTEGER.
        let row: Option<TitleRow> = diesel::update(titles::table.find(title_id.as_uuid()))
            .set((
                TitleDetailsChangeset::from(details),
                titles::available_copies.eq(greatest(
                    0,
                    least(
                        new_total,
                        titles::available_copies - titles::total_copies + new_total,
                    ),
                )),
                titles::total_copies.eq(new_total),
                titles::updated_at.eq(Utc::now()),
            ))
            .returning(TitleRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_into_title).transpose()
    }

    async fn delete(&self, title_id: TitleId) -> Result<bool, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = diesel::delete(titles::table.find(title_id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(|err| {
                if is_foreign_key_violation(&err) {
                    CatalogueRepositoryError::in_use(title_id.to_string())
                } else {
                    map_diesel_error(err)
                }
            })?;
        Ok(rows > 0)
    }
}
