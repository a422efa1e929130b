//! Circulation endpoints: borrow, return and loan listings.
//!
//! ```text
//! POST /api/v1/loans {"titleId":"..."}
//! POST /api/v1/loans/{loanId}/return
//! GET  /api/v1/users/me/loans
//! GET  /api/v1/admin/loans
//! ```
//!
//! Each handler resolves the caller from the session, checks its capability
//! and only then invokes the circulation ports.

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Capability, Loan, LoanStatus};
use crate::domain::ports::{BorrowRequest, ReturnRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::require_capability;
use crate::inbound::http::schemas::{ErrorSchema, LoanStatusSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_loan_id, parse_title_id};

const TITLE_ID_FIELD: FieldName = FieldName::new("titleId");
const LOAN_ID_FIELD: FieldName = FieldName::new("loanId");

/// Request body for `POST /api/v1/loans`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowPayload {
    /// Title to borrow.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub title_id: String,
}

/// Loan as returned to clients.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanResponse {
    pub id: String,
    pub user_id: String,
    pub title_id: String,
    #[schema(value_type = LoanStatusSchema)]
    pub status: LoanStatus,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        Self {
            id: loan.id().to_string(),
            user_id: loan.user_id().to_string(),
            title_id: loan.title_id().to_string(),
            status: loan.status(),
            borrowed_at: loan.borrowed_at(),
            due_at: loan.due_at(),
            returned_at: loan.returned_at(),
        }
    }
}

fn to_responses(loans: Vec<Loan>) -> Vec<LoanResponse> {
    loans.into_iter().map(LoanResponse::from).collect()
}

/// Borrow one copy of a title for the session user.
#[utoipa::path(
    post,
    path = "/api/v1/loans",
    request_body = BorrowPayload,
    responses(
        (status = 201, description = "Loan opened", body = LoanResponse),
        (status = 400, description = "Malformed title id", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 409, description = "Already borrowed or no copies left", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["loans"],
    operation_id = "borrowTitle",
    security(("SessionCookie" = []))
)]
#[post("/loans")]
pub async fn borrow(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<BorrowPayload>,
) -> ApiResult<HttpResponse> {
    let caller = require_capability(&session, Capability::Borrow)?;
    let title_id = parse_title_id(&payload.title_id, TITLE_ID_FIELD)?;
    let loan = state
        .circulation
        .borrow(&caller, BorrowRequest { title_id })
        .await?;
    Ok(HttpResponse::Created().json(LoanResponse::from(loan)))
}

/// Return one of the session user's active loans.
#[utoipa::path(
    post,
    path = "/api/v1/loans/{loanId}/return",
    params(("loanId" = String, Path, description = "Loan identifier")),
    responses(
        (status = 200, description = "Loan closed", body = LoanResponse),
        (status = 400, description = "Malformed loan id", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Loan belongs to another user", body = ErrorSchema),
        (status = 404, description = "Unknown loan", body = ErrorSchema),
        (status = 409, description = "Loan already returned", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["loans"],
    operation_id = "returnLoan",
    security(("SessionCookie" = []))
)]
#[post("/loans/{loan_id}/return")]
pub async fn return_loan(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<LoanResponse>> {
    let caller = require_capability(&session, Capability::Return)?;
    let loan_id = parse_loan_id(&path, LOAN_ID_FIELD)?;
    let loan = state
        .circulation
        .return_loan(&caller, ReturnRequest { loan_id })
        .await?;
    Ok(web::Json(LoanResponse::from(loan)))
}

/// List every loan the session user has ever held, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/loans",
    responses(
        (status = 200, description = "Caller's loans", body = [LoanResponse]),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["loans"],
    operation_id = "listMyLoans",
    security(("SessionCookie" = []))
)]
#[get("/users/me/loans")]
pub async fn list_my_loans(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<LoanResponse>>> {
    let caller = require_capability(&session, Capability::ListOwnLoans)?;
    let loans = state.circulation_query.list_by_user(&caller).await?;
    Ok(web::Json(to_responses(loans)))
}

/// List every loan in the library. Administrators only.
#[utoipa::path(
    get,
    path = "/api/v1/admin/loans",
    responses(
        (status = 200, description = "All loans", body = [LoanResponse]),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["loans"],
    operation_id = "listAllLoans",
    security(("SessionCookie" = []))
)]
#[get("/admin/loans")]
pub async fn list_all_loans(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<LoanResponse>>> {
    let caller = require_capability(&session, Capability::ListAllLoans)?;
    let loans = state.circulation_query.list_all(&caller).await?;
    Ok(web::Json(to_responses(loans)))
}
