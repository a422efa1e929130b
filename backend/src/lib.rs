//! School library circulation service.
//!
//! The domain layer owns the circulation engine and catalogue rules; inbound
//! HTTP handlers and outbound stores adapt it to actix-web and PostgreSQL.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
