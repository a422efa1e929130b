//! Domain primitives, aggregates and use cases.
//!
//! Purpose: Define strongly typed library entities used by the API and
//! persistence layers and the services that operate on them. Types keep
//! their invariants behind constructors; serialisation contracts are
//! documented on each type.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - Caller (alias to `user::Caller`): identity and role of a request.
//! - Title / Loan: catalogue entries and the loan ledger.
//! - CirculationService: borrow, return and loan listings.
//! - CatalogueService: administrative catalogue edits and reads.
//! - AccountService: registration and password login.

pub mod access;
pub mod account;
pub mod account_service;
pub mod auth;
pub mod catalogue_service;
pub mod circulation;
pub mod error;
pub mod loan;
pub mod ports;
pub mod title;
pub mod trace_id;
pub mod user;

pub use self::access::{AccessDenied, Capability, authorize};
pub use self::account::{
    AccountValidationError, FIXTURE_ACCOUNTS, FIXTURE_PASSWORD, PasswordHash, Registration,
    UserAccount, UserAccountRecord, Username,
};
pub use self::account_service::AccountService;
pub use self::auth::{AuthenticatedUser, LoginCredentials, LoginValidationError};
pub use self::catalogue_service::CatalogueService;
pub use self::circulation::{CirculationError, CirculationService};
pub use self::error::{Error, ErrorCode, ErrorDto, ErrorValidationError, TRACE_ID_HEADER};
pub use self::loan::{Loan, LoanId, LoanPeriod, LoanRecord, LoanStatus, NotActive};
pub use self::title::{
    CopyCounts, Title, TitleDetails, TitleDetailsDraft, TitleId, TitleValidationError,
};
pub use self::trace_id::TraceId;
pub use self::user::{Caller, Role, UserId, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use schoollib::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
