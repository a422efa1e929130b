//! Catalogue management domain service.
//!
//! Implements the catalogue driving ports over a [`CatalogueRepository`].
//! Availability arithmetic for total edits is delegated to the repository so
//! it runs inside one atomic write alongside concurrent borrows and returns.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    CatalogueCommand, CatalogueQuery, CatalogueRepository, CatalogueRepositoryError, NewTitle,
    TitleUpdate,
};
use crate::domain::{CopyCounts, Error, Title, TitleId};

/// Catalogue service implementing the catalogue driving ports.
#[derive(Clone)]
pub struct CatalogueService<R> {
    repository: Arc<R>,
}

impl<R> CatalogueService<R> {
    /// Create a new service with the given repository.
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

impl<R> CatalogueService<R>
where
    R: CatalogueRepository,
{
    fn map_repository_error(error: CatalogueRepositoryError) -> Error {
        match error {
            CatalogueRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("catalogue repository unavailable: {message}"))
            }
            CatalogueRepositoryError::Query { message } => {
                Error::internal(format!("catalogue repository error: {message}"))
            }
            CatalogueRepositoryError::InUse { title_id } => {
                Error::conflict("title has loan history and cannot be deleted").with_details(
                    json!({
                        "titleId": title_id,
                        "code": "title_in_use",
                    }),
                )
            }
        }
    }

    fn title_not_found(title_id: TitleId) -> Error {
        Error::not_found(format!("title {title_id} not found")).with_details(json!({
            "titleId": title_id,
            "code": "title_not_found",
        }))
    }
}

#[async_trait]
impl<R> CatalogueCommand for CatalogueService<R>
where
    R: CatalogueRepository,
{
    async fn create(&self, request: NewTitle) -> Result<Title, Error> {
        let NewTitle { details, total } = request;
        let title = Title::new(
            TitleId::random(),
            details,
            CopyCounts::fully_available(total),
        );
        self.repository
            .insert(&title)
            .await
            .map_err(Self::map_repository_error)?;
        info!(title_id = %title.id(), total, "title catalogued");
        Ok(title)
    }

    async fn update(&self, title_id: TitleId, request: TitleUpdate) -> Result<Title, Error> {
        let TitleUpdate { details, total } = request;
        let title = self
            .repository
            .update(title_id, &details, total)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| Self::title_not_found(title_id))?;
        info!(
            title_id = %title_id,
            total = title.copies().total(),
            available = title.copies().available(),
            "title updated"
        );
        Ok(title)
    }

    async fn delete(&self, title_id: TitleId) -> Result<(), Error> {
        let removed = self
            .repository
            .delete(title_id)
            .await
            .map_err(Self::map_repository_error)?;
        if !removed {
            return Err(Self::title_not_found(title_id));
        }
        info!(title_id = %title_id, "title removed");
        Ok(())
    }
}

#[async_trait]
impl<R> CatalogueQuery for CatalogueService<R>
where
    R: CatalogueRepository,
{
    async fn get(&self, title_id: TitleId) -> Result<Title, Error> {
        self.repository
            .find_by_id(title_id)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or_else(|| Self::title_not_found(title_id))
    }

    async fn list(&self) -> Result<Vec<Title>, Error> {
        self.repository
            .list()
            .await
            .map_err(Self::map_repository_error)
    }
}
