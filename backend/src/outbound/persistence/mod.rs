//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of the circulation store,
//! catalogue repository and user repository ports backed by PostgreSQL via
//! the Diesel ORM with async support through `diesel-async` and `bb8`
//! connection pooling.
//!
//! # Architecture
//!
//! The persistence layer follows these principles:
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types. Stock and loan guards are expressed as
//!   conditional SQL writes, never as read-then-write in Rust.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are internal implementation details, never
//!   exposed to the domain layer.
//! - **Async-safe pooling**: Connections are managed via `bb8` pools with
//!   proper async integration through `diesel-async`.
//! - **Strongly typed errors**: All database errors are mapped to domain
//!   port error types.
//!
//! # Example
//!
//! ```rust,no_run
//! use schoollib::outbound::persistence::{
//!     DbPool, DieselCatalogueRepository, DieselCirculationStore, PoolConfig,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/library")).await?;
//! let store = DieselCirculationStore::new(pool.clone());
//! let catalogue = DieselCatalogueRepository::new(pool);
//! # let _ = (store, catalogue);
//! # Ok(())
//! # }
//! ```

mod diesel_basic_error_mapping;
mod diesel_catalogue_repository;
mod diesel_circulation_store;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_catalogue_repository::DieselCatalogueRepository;
pub use diesel_circulation_store::DieselCirculationStore;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
