//! Registration, login and logout handlers.
//!
//! ```text
//! POST /api/v1/register {"username":"ada","password":"lovelace","role":"STUDENT"}
//! POST /api/v1/login {"username":"student","password":"password"}
//! POST /api/v1/logout
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::domain::{
    AccountValidationError, Capability, Error, LoginCredentials, LoginValidationError,
    Registration, Role, UserAccount,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::require_capability;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body for `POST /api/v1/login`.
///
/// Example JSON:
/// `{"username":"student","password":"password"}`
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

/// Registration request body for `POST /api/v1/register`.
///
/// Example JSON:
/// `{"username":"ada","password":"lovelace","role":"STUDENT","contact":"room 4"}`
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// 3 to 20 characters once trimmed.
    pub username: String,
    /// 6 to 50 characters.
    pub password: String,
    /// `STUDENT`, `TEACHER` or `ADMIN`, case-insensitive.
    #[schema(example = "STUDENT")]
    pub role: String,
    /// Optional phone number or e-mail address.
    #[serde(default)]
    pub contact: Option<String>,
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = AccountValidationError;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(
            &value.username,
            &value.password,
            &value.role,
            value.contact.as_deref(),
        )
    }
}

/// Account created by `POST /api/v1/register`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    /// New user id.
    #[schema(example = "0b6f2c8e-4d1a-4f5e-8c3b-7a9d2e1f0c44")]
    pub user_id: String,
    /// Normalised login name.
    pub username: String,
    /// Granted role.
    #[schema(value_type = crate::inbound::http::schemas::RoleSchema)]
    pub role: Role,
    /// Contact detail, if given.
    pub contact: Option<String>,
}

impl From<UserAccount> for RegisteredUser {
    fn from(account: UserAccount) -> Self {
        Self {
            user_id: account.id().to_string(),
            username: account.username().to_string(),
            role: account.role(),
            contact: account.contact().map(str::to_owned),
        }
    }
}

/// Open a member account.
///
/// Anyone may register as STUDENT or TEACHER. Registering an ADMIN requires
/// an administrator session.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisteredUser),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Login required to register an ADMIN", body = ErrorSchema),
        (status = 403, description = "Administrator role required", body = ErrorSchema),
        (status = 409, description = "Username already taken", body = ErrorSchema)
    ),
    tags = ["session"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration =
        Registration::try_from(payload.into_inner()).map_err(map_account_validation_error)?;
    if registration.role() == Role::Admin {
        require_capability(&session, Capability::RegisterAdmin)?;
    }
    let account = state.registration.register(registration).await?;
    Ok(HttpResponse::Created().json(RegisteredUser::from(account)))
}

fn map_account_validation_error(err: AccountValidationError) -> Error {
    let (field, code) = match &err {
        AccountValidationError::UsernameLength => ("username", "username_length"),
        AccountValidationError::PasswordLength => ("password", "password_length"),
        AccountValidationError::UnknownRole(_) => ("role", "unknown_role"),
        AccountValidationError::ContactTooLong => ("contact", "contact_too_long"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Identity established by a successful login.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    /// Authenticated user id.
    #[schema(example = "5b8e2a9c-1f0d-4c3e-9a7b-0d6f4e2c1a01")]
    pub user_id: String,
    /// Role granted to the user.
    #[schema(value_type = crate::inbound::http::schemas::RoleSchema)]
    pub role: Role,
}

/// Authenticate a member and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = SessionUser,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["session"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<SessionUser>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let user = state.login.authenticate(&credentials).await?;
    session.persist_user(&user)?;
    info!(user_id = %user.user_id, role = %user.role, "session established");
    Ok(web::Json(SessionUser {
        user_id: user.user_id.to_string(),
        role: user.role,
    }))
}

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyUsername => Error::invalid_request("username must not be empty")
            .with_details(json!({ "field": "username", "code": "empty_username" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Drop the current session. Succeeds for anonymous callers too.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tags = ["session"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}
