//! Tests for HTTP error mapping.

use super::*;
use crate::domain::access::Capability;
use crate::domain::{Error, LoanId, LoanStatus, Role, TitleId};
use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::{fixture, rstest};
use rstest_bdd_macros::{given, then, when};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[fixture]
fn internal_error_case(expected_trace_id: String) -> Error {
    Error::internal("boom")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"secret": "x"}))
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("taken"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] err: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), status);
}

async fn assert_error_response(
    error: Error,
    expected_status: StatusCode,
    expected_trace_id: Option<&str>,
) -> Error {
    let response = ResponseError::error_response(&error);
    assert_eq!(response.status(), expected_status);

    let header = response.headers().get(TRACE_ID_HEADER);
    match expected_trace_id {
        Some(expected) => {
            let trace_id = header
                .expect("trace-id header is set by error_response")
                .to_str()
                .expect("trace-id not valid UTF-8");
            assert_eq!(trace_id, expected);
        }
        None => assert!(header.is_none(), "trace-id header should not be present"),
    }

    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");

    serde_json::from_slice(&bytes).expect("Error JSON deserialisation succeeds")
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted_but_keep_the_trace(
    #[from(internal_error_case)] internal_error: Error,
    expected_trace_id: String,
) {
    let redacted = assert_error_response(
        internal_error,
        StatusCode::INTERNAL_SERVER_ERROR,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(redacted.code(), ErrorCode::InternalError);
    assert_eq!(redacted.message(), "Internal server error");
    assert!(redacted.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn error_without_trace_id_omits_trace_header() {
    let error = Error::invalid_request("bad").with_details(json!({"field": "titleId"}));

    let payload = assert_error_response(error, StatusCode::BAD_REQUEST, None).await;
    assert_eq!(payload.code(), ErrorCode::InvalidRequest);
    assert_eq!(payload.message(), "bad");
    assert_eq!(payload.trace_id(), None);
    assert_eq!(payload.details(), Some(&json!({"field": "titleId"})));
}

fn detail_code(error: &Error) -> Option<&str> {
    error
        .details()
        .and_then(|details| details.get("code"))
        .and_then(|code| code.as_str())
}

#[rstest]
#[case(
    CirculationError::AlreadyBorrowed { title_id: TitleId::random() },
    StatusCode::CONFLICT,
    "already_borrowed"
)]
#[case(
    CirculationError::StockInsufficient { title_id: TitleId::random() },
    StatusCode::CONFLICT,
    "stock_insufficient"
)]
#[case(
    CirculationError::LoanNotFound { loan_id: LoanId::random() },
    StatusCode::NOT_FOUND,
    "loan_not_found"
)]
#[case(
    CirculationError::NotOwner { loan_id: LoanId::random() },
    StatusCode::FORBIDDEN,
    "not_owner"
)]
#[case(
    CirculationError::InvalidReturnState {
        loan_id: LoanId::random(),
        status: LoanStatus::Returned,
    },
    StatusCode::CONFLICT,
    "invalid_return_state"
)]
fn circulation_rejections_keep_their_kind(
    #[case] failure: CirculationError,
    #[case] status: StatusCode,
    #[case] code: &str,
) {
    let error = Error::from(failure);
    assert_eq!(ResponseError::status_code(&error), status);
    assert_eq!(detail_code(&error), Some(code));
}

#[rstest]
fn store_connection_failures_are_unavailable() {
    let error = Error::from(CirculationError::Store(CirculationStoreError::connection(
        "pool timed out",
    )));
    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[actix_web::test]
async fn store_query_failures_are_redacted() {
    let error = Error::from(CirculationError::Store(CirculationStoreError::query(
        "relation \"loans\" does not exist",
    )));
    let payload = assert_error_response(error, StatusCode::INTERNAL_SERVER_ERROR, None).await;
    assert_eq!(payload.message(), "Internal server error");
}

#[rstest]
fn access_denials_are_forbidden() {
    let error = Error::from(AccessDenied {
        role: Role::Student,
        capability: Capability::ListAllLoans,
    });
    assert_eq!(error.code(), ErrorCode::Forbidden);
    assert_eq!(error.message(), "role STUDENT may not list_all_loans");
    assert_eq!(detail_code(&error), Some("capability_denied"));
}

#[given("a conflict error code")]
fn a_conflict_error_code() -> ErrorCode {
    ErrorCode::Conflict
}

#[when("the adapter maps the code to an HTTP status")]
fn the_adapter_maps_the_code_to_http_status(code: ErrorCode) -> StatusCode {
    super::status_for(code)
}

#[then("the status is 409 Conflict")]
fn the_status_is_409_conflict(status: StatusCode) {
    assert_eq!(status, StatusCode::CONFLICT);
}

#[given("an internal error template")]
fn an_internal_error_template() -> (ErrorCode, &'static str) {
    (ErrorCode::InternalError, "boom")
}

#[when("the adapter redacts the client payload")]
fn the_adapter_redacts_the_client_payload(template: (ErrorCode, &'static str)) -> String {
    let (code, message) = template;
    let error = if let ErrorCode::InternalError = code {
        Error::internal(message)
    } else {
        Error::invalid_request(message)
    }
    .with_trace_id(TRACE_ID)
    .with_details(json!({"secret": true}));

    super::redact_if_internal(&error).message().to_owned()
}

#[then("clients see the generic internal error message")]
fn clients_see_the_generic_internal_error_message(message: String) {
    assert_eq!(message, "Internal server error");
}

#[rstest]
fn conflicts_map_to_409() {
    let code = a_conflict_error_code();
    let status = the_adapter_maps_the_code_to_http_status(code);
    the_status_is_409_conflict(status);
}

#[rstest]
fn internal_payloads_are_redacted() {
    let template = an_internal_error_template();
    let message = the_adapter_redacts_the_client_payload(template);
    clients_see_the_generic_internal_error_message(message);
}

#[test]
fn from_actix_error_is_redacted_internal_error() {
    use actix_web::error;

    let actix_err = error::ErrorBadRequest("boom");
    let err: Error = actix_err.into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert_eq!(err.trace_id(), None);
    assert_eq!(err.details(), None);
}
