//! Tests for session and account handlers.

use super::*;
use crate::domain::{
    Amount, Error, ItemId, PaymentReference, PurchaseStatus, UserRole,
};
use crate::inbound::http::session::{INIT_DATA_HEADER, SESSION_COOKIE_NAME};
use crate::inbound::http::test_utils::{TestPorts, identity, signed_init_data, user_for};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use chrono::Utc;
use rstest::rstest;
use serde_json::{Value, json};

fn test_app(
    ports: TestPorts,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new().app_data(web::Data::new(ports.into_state())).service(
        web::scope("/api/v1")
            .service(create_session)
            .service(current_user)
            .service(purchase_history),
    )
}

#[actix_web::test]
async fn session_sets_a_hardened_cookie() {
    let app = actix_test::init_service(test_app(TestPorts::default().resolving_any_identity())).await;
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/session")
        .set_json(json!({ "initDataRaw": signed_init_data("4242") }))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let cookie = res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .expect("session cookie")
        .into_owned();
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(actix_web::cookie::SameSite::Lax));
    assert_eq!(
        cookie.max_age(),
        Some(actix_web::cookie::time::Duration::days(30))
    );

    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body.pointer("/user/externalId"), Some(&json!("4242")));
    assert_eq!(body.pointer("/user/role"), Some(&json!("buyer")));
    assert_eq!(body.pointer("/user/displayName"), Some(&json!("Ada")));
}

#[actix_web::test]
async fn issued_cookie_authenticates_later_requests() {
    let app = actix_test::init_service(test_app(TestPorts::default().resolving_any_identity())).await;
    let login = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/session")
            .set_json(json!({ "initDataRaw": signed_init_data("4242") }))
            .to_request(),
    )
    .await;
    let cookie = login
        .response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .expect("session cookie")
        .into_owned();

    let me = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/users/me")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(me.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(me).await;
    assert_eq!(body.get("externalId"), Some(&json!("4242")));
}

#[rstest]
#[case::missing(json!({}), StatusCode::BAD_REQUEST, "missing_field")]
#[case::blank(json!({ "initDataRaw": "  " }), StatusCode::BAD_REQUEST, "missing_field")]
#[case::unsigned(json!({ "initDataRaw": "user=%7B%22id%22%3A1%7D" }), StatusCode::UNAUTHORIZED, "invalid")]
#[actix_web::test]
async fn session_rejects_bad_init_data(
    #[case] body: Value,
    #[case] status: StatusCode,
    #[case] reason: &str,
) {
    let app = actix_test::init_service(test_app(TestPorts::default())).await;
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/session")
        .set_json(body)
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), status);
    assert!(res.response().cookies().next().is_none());
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body.pointer("/details/code"), Some(&json!(reason)));
}

#[actix_web::test]
async fn session_surfaces_storage_outages() {
    let mut ports = TestPorts::default();
    ports
        .identity
        .expect_resolve()
        .return_once(|_| Err(Error::service_unavailable("user repository unavailable")));
    let app = actix_test::init_service(test_app(ports)).await;
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/session")
        .set_json(json!({ "initDataRaw": signed_init_data("4242") }))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn purchase_history_lists_the_callers_rows() {
    let buyer = user_for(&identity("4242"));
    let buyer_id = buyer.id;
    let mut ports = TestPorts::default();
    ports
        .identity
        .expect_resolve()
        .return_once(move |_| Ok(buyer));
    ports
        .items
        .expect_purchase_history()
        .withf(move |id| *id == buyer_id)
        .return_once(move |_| {
            let mut completed = crate::domain::Purchase::pending(
                ItemId::random(),
                buyer_id,
                PaymentReference::new("BT-1700000000000-K3J9Q2Z").expect("valid"),
                Amount::new(50_000).expect("valid"),
                Utc::now(),
            );
            completed.status = PurchaseStatus::Completed;
            completed.completed_at = Some(Utc::now());
            Ok(vec![completed])
        });
    let app = actix_test::init_service(test_app(ports)).await;
    let req = actix_test::TestRequest::get()
        .uri("/api/v1/users/me/purchases")
        .insert_header((INIT_DATA_HEADER, signed_init_data("4242")))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    let rows = body.as_array().expect("array body");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("status"), Some(&json!("completed")));
    assert_eq!(rows[0].get("amountExpected"), Some(&json!(50_000)));
    assert!(rows[0].get("completedAt").is_some_and(Value::is_string));
}

#[rstest]
fn user_response_uses_storage_role_names() {
    let mut user = user_for(&identity("9"));
    user.role = UserRole::Both;
    let response = UserResponse::from(user);
    assert_eq!(response.role, "both");
    assert_eq!(response.username.as_deref(), Some("ada"));
}
