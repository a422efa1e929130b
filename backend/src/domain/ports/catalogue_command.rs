//! Driving ports for catalogue management.

use async_trait::async_trait;

use crate::domain::{Error, Title, TitleDetails, TitleId};

/// Request to catalogue a new title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTitle {
    /// Validated metadata.
    pub details: TitleDetails,
    /// Copies owned; all start on the shelf.
    pub total: u32,
}

/// Request to edit a catalogued title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleUpdate {
    /// Replacement metadata.
    pub details: TitleDetails,
    /// New number of copies owned.
    pub total: u32,
}

/// Catalogue edits; restricted to administrators by the inbound adapter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueCommand: Send + Sync {
    /// Catalogue a title with every copy available.
    async fn create(&self, request: NewTitle) -> Result<Title, Error>;

    /// Replace metadata and total, shifting availability by the raw delta.
    async fn update(&self, title_id: TitleId, request: TitleUpdate) -> Result<Title, Error>;

    /// Remove a title that has never been lent.
    async fn delete(&self, title_id: TitleId) -> Result<(), Error>;
}

/// Public catalogue reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueQuery: Send + Sync {
    /// Fetch one title.
    async fn get(&self, title_id: TitleId) -> Result<Title, Error>;

    /// All titles ordered by name.
    async fn list(&self) -> Result<Vec<Title>, Error>;
}
