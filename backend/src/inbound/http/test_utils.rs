//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::test;
use chrono::Utc;
use mockable::DefaultClock;
use serde_json::json;

use crate::domain::{
    AccountService, CatalogueService, CirculationService, FIXTURE_PASSWORD, LoanPeriod,
    UserAccount,
};
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::memory::{InMemoryLibrary, InMemoryUsers};

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Extract the `session` cookie set by a response.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Account table holding only the seed accounts.
pub fn seeded_users() -> InMemoryUsers {
    InMemoryUsers::with_accounts(UserAccount::fixtures(Utc::now()).expect("valid seed accounts"))
}

/// HTTP state wired to a shared in-memory library and the seed accounts.
pub fn memory_state(library: &InMemoryLibrary) -> HttpState {
    let accounts = Arc::new(AccountService::new(
        Arc::new(seeded_users()),
        Arc::new(DefaultClock),
    ));
    let store = Arc::new(library.clone());
    let circulation = Arc::new(CirculationService::new(
        store,
        Arc::new(DefaultClock),
        LoanPeriod::default(),
    ));
    let catalogue = Arc::new(CatalogueService::new(Arc::new(library.clone())));
    HttpState::new(HttpStatePorts {
        login: accounts.clone(),
        registration: accounts,
        circulation: circulation.clone(),
        circulation_query: circulation,
        catalogue: catalogue.clone(),
        catalogue_query: catalogue,
    })
}

/// Log in as one of the seed accounts through `POST /api/v1/login` and
/// return the session cookie.
pub async fn login_as<S>(app: &S, username: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(json!({ "username": username, "password": FIXTURE_PASSWORD }))
        .to_request();
    let response = test::call_service(app, request).await;
    assert!(response.status().is_success(), "seed account login succeeds");
    session_cookie(&response)
}
