//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every circulation, catalogue, account and health
//! endpoint together with the schema wrappers from
//! [`crate::inbound::http::schemas`], which keep domain types free of utoipa
//! derives. The document backs Swagger UI in debug builds and is exported by
//! the `openapi-dump` binary.

use crate::inbound::http::health::{ProbeBody, StorageBackend};
use crate::inbound::http::loans::{BorrowPayload, LoanResponse};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema, LoanStatusSchema, RoleSchema};
use crate::inbound::http::titles::{TitlePayload, TitleResponse};
use crate::inbound::http::users::{LoginRequest, RegisterRequest, RegisteredUser, SessionUser};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Adds the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "School library circulation API",
        description = "Register members, borrow and return copies of catalogued titles, \
            list loans and manage the catalogue."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::register,
        crate::inbound::http::loans::borrow,
        crate::inbound::http::loans::return_loan,
        crate::inbound::http::loans::list_my_loans,
        crate::inbound::http::loans::list_all_loans,
        crate::inbound::http::titles::list_titles,
        crate::inbound::http::titles::get_title,
        crate::inbound::http::titles::create_title,
        crate::inbound::http::titles::update_title,
        crate::inbound::http::titles::delete_title,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        RoleSchema,
        LoanStatusSchema,
        LoginRequest,
        SessionUser,
        RegisterRequest,
        RegisteredUser,
        BorrowPayload,
        LoanResponse,
        TitlePayload,
        TitleResponse,
        ProbeBody,
        StorageBackend
    )),
    tags(
        (name = "session", description = "Registration, login and logout"),
        (name = "loans", description = "Borrowing, returning and loan listings"),
        (name = "titles", description = "Catalogue reads and administration"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
