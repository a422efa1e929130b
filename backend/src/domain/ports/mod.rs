//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`CirculationStore`, `CatalogueRepository`, `UserRepository`)
//! are implemented by outbound adapters. Driving ports (`CirculationCommand`,
//! `CirculationQuery`, `CatalogueCommand`, `CatalogueQuery`, `LoginService`,
//! `RegistrationCommand`) are implemented by domain services and called by
//! inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod catalogue_command;
mod catalogue_repository;
mod circulation_command;
mod circulation_store;
mod login_service;
mod registration_command;
mod user_repository;

#[cfg(test)]
pub use catalogue_command::{MockCatalogueCommand, MockCatalogueQuery};
pub use catalogue_command::{CatalogueCommand, CatalogueQuery, NewTitle, TitleUpdate};
#[cfg(test)]
pub use catalogue_repository::MockCatalogueRepository;
pub use catalogue_repository::{CatalogueRepository, CatalogueRepositoryError};
#[cfg(test)]
pub use circulation_command::{MockCirculationCommand, MockCirculationQuery};
pub use circulation_command::{BorrowRequest, CirculationCommand, CirculationQuery, ReturnRequest};
pub use circulation_store::{CirculationStore, CirculationStoreError, CirculationTransaction};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use registration_command::MockRegistrationCommand;
pub use registration_command::RegistrationCommand;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
