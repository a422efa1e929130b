//! Outbound adapters implementing domain ports for storage.
//!
//! - **persistence**: PostgreSQL-backed store and repository using Diesel ORM
//! - **memory**: in-process store used when no database is configured and in
//!   tests
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod memory;
pub mod persistence;
