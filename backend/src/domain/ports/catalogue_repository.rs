//! Driven port for catalogue title persistence.

use async_trait::async_trait;

use crate::domain::{Title, TitleDetails, TitleId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by catalogue repository adapters.
    pub enum CatalogueRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "catalogue repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "catalogue repository query failed: {message}",
        /// The title is referenced by loans and cannot be removed.
        InUse { title_id: String } =>
            "title {title_id} is referenced by loans",
    }
}

/// Port for reading and writing catalogue titles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueRepository: Send + Sync {
    /// Store a new title.
    async fn insert(&self, title: &Title) -> Result<(), CatalogueRepositoryError>;

    /// Look a title up by id.
    async fn find_by_id(&self, title_id: TitleId)
    -> Result<Option<Title>, CatalogueRepositoryError>;

    /// All titles ordered by name, then id.
    async fn list(&self) -> Result<Vec<Title>, CatalogueRepositoryError>;

    /// Replace the metadata and total of a title.
    ///
    /// The available count must shift by `new_total - old_total`, clamped to
    /// `[0, new_total]`, in the same atomic write so concurrent borrows and
    /// returns are never lost. Returns `None` when the title does not exist.
    async fn update(
        &self,
        title_id: TitleId,
        details: &TitleDetails,
        new_total: u32,
    ) -> Result<Option<Title>, CatalogueRepositoryError>;

    /// Remove a title. Returns `false` when it did not exist.
    async fn delete(&self, title_id: TitleId) -> Result<bool, CatalogueRepositoryError>;
}
