//! Tests for catalogue handlers.

use super::*;
use crate::inbound::http::loans::{borrow, return_loan};
use crate::inbound::http::test_utils::{login_as, memory_state, test_session_middleware};
use crate::inbound::http::users::login;
use crate::outbound::memory::InMemoryLibrary;
use actix_web::cookie::Cookie;
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use rstest::rstest;
use serde_json::{Value, json};

fn test_app(
    library: &InMemoryLibrary,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    App::new()
        .app_data(web::Data::new(memory_state(library)))
        .wrap(test_session_middleware())
        .service(
            web::scope("/api/v1")
                .service(login)
                .service(list_titles)
                .service(get_title)
                .service(create_title)
                .service(update_title)
                .service(delete_title)
                .service(borrow)
                .service(return_loan),
        )
}

fn payload(name: &str, total: i64) -> Value {
    json!({ "name": name, "author": "Roald Dahl", "totalCopies": total })
}

async fn create<S>(app: &S, admin: Cookie<'static>, name: &str, total: i64) -> TitleResponse
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let response = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/v1/titles")
            .cookie(admin)
            .set_json(payload(name, total))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    actix_test::read_body_json(response).await
}

async fn borrow_one<S>(app: &S, cookie: Cookie<'static>, title_id: &str)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let response = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/v1/loans")
            .cookie(cookie)
            .set_json(json!({ "titleId": title_id }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn admins_catalogue_titles_fully_available() {
    let library = InMemoryLibrary::new();
    let app = actix_test::init_service(test_app(&library)).await;
    let admin = login_as(&app, "admin").await;

    let created = create(&app, admin, "  Matilda ", 3).await;
    assert_eq!(created.name, "Matilda");
    assert_eq!(created.total_copies, 3);
    assert_eq!(created.available_copies, 3);

    let fetched = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/titles/{}", created.id))
            .to_request(),
    )
    .await;
    assert_eq!(fetched.status(), StatusCode::OK);
    let fetched: TitleResponse = actix_test::read_body_json(fetched).await;
    assert_eq!(fetched.author.as_deref(), Some("Roald Dahl"));
}

#[rstest]
#[case("student")]
#[case("teacher")]
#[actix_web::test]
async fn members_cannot_edit_the_catalogue(#[case] username: &str) {
    let library = InMemoryLibrary::new();
    let app = actix_test::init_service(test_app(&library)).await;
    let cookie = login_as(&app, username).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/titles")
            .cookie(cookie)
            .set_json(payload("Holes", 1))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[rstest]
#[case(payload("Holes", -1), "totalCopies", "negative_count")]
#[case(payload("   ", 2), "name", "empty_name")]
#[actix_web::test]
async fn invalid_payloads_are_rejected(
    #[case] body: Value,
    #[case] field: &str,
    #[case] code: &str,
) {
    let library = InMemoryLibrary::new();
    let app = actix_test::init_service(test_app(&library)).await;
    let admin = login_as(&app, "admin").await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/titles")
            .cookie(admin)
            .set_json(body)
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = actix_test::read_body_json(response).await;
    assert_eq!(error["details"]["field"], field);
    assert_eq!(error["details"]["code"], code);
}

#[rstest]
#[case(5, 3, 1)]
#[case(5, 6, 4)]
#[case(5, 4, 2)]
#[case(5, 1, 0)]
#[case(5, 0, 0)]
#[actix_web::test]
async fn total_edits_shift_availability_with_clamping(
    #[case] initial: i64,
    #[case] new_total: i64,
    #[case] expected_available: u32,
) {
    let library = InMemoryLibrary::new();
    let app = actix_test::init_service(test_app(&library)).await;
    let admin = login_as(&app, "admin").await;
    let student = login_as(&app, "student").await;
    let teacher = login_as(&app, "teacher").await;

    let title = create(&app, admin.clone(), "Frindle", initial).await;
    borrow_one(&app, student, &title.id).await;
    borrow_one(&app, teacher, &title.id).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::put()
            .uri(&format!("/api/v1/titles/{}", title.id))
            .cookie(admin)
            .set_json(payload("Frindle", new_total))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: TitleResponse = actix_test::read_body_json(response).await;
    assert_eq!(i64::from(updated.total_copies), new_total);
    assert_eq!(updated.available_copies, expected_available);
}

#[actix_web::test]
async fn titles_with_loan_history_cannot_be_deleted() {
    let library = InMemoryLibrary::new();
    let app = actix_test::init_service(test_app(&library)).await;
    let admin = login_as(&app, "admin").await;
    let student = login_as(&app, "student").await;

    let lent = create(&app, admin.clone(), "Wonder", 1).await;
    let untouched = create(&app, admin.clone(), "Hatchet", 1).await;
    borrow_one(&app, student, &lent.id).await;

    let conflict = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri(&format!("/api/v1/titles/{}", lent.id))
            .cookie(admin.clone())
            .to_request(),
    )
    .await;
    assert_eq!(conflict.status(), StatusCode::CONFLICT);
    let error: Value = actix_test::read_body_json(conflict).await;
    assert_eq!(error["details"]["code"], "title_in_use");

    let removed = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri(&format!("/api/v1/titles/{}", untouched.id))
            .cookie(admin.clone())
            .to_request(),
    )
    .await;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);

    let missing = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri(&format!("/api/v1/titles/{}", untouched.id))
            .cookie(admin)
            .to_request(),
    )
    .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn catalogue_listing_is_public_and_sorted() {
    let library = InMemoryLibrary::new();
    let app = actix_test::init_service(test_app(&library)).await;
    let admin = login_as(&app, "admin").await;
    create(&app, admin.clone(), "Wonder", 1).await;
    create(&app, admin, "Coraline", 2).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/api/v1/titles").to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let titles: Vec<TitleResponse> = actix_test::read_body_json(response).await;
    let names: Vec<_> = titles.iter().map(|title| title.name.as_str()).collect();
    assert_eq!(names, vec!["Coraline", "Wonder"]);
}

#[actix_web::test]
async fn malformed_title_paths_are_bad_requests() {
    let app = actix_test::init_service(test_app(&InMemoryLibrary::new())).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/titles/shelf-7")
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = actix_test::read_body_json(response).await;
    assert_eq!(error["details"]["code"], "invalid_uuid");
}
