use actix_web::{http::StatusCode, test::TestRequest};
use chrono::{Duration, Utc};
use fks_engine::db_types::Role;

use super::{
    helpers::{checkout_request, issue_token, send_request, test_db, valid_token, with_bearer},
    mocks::MockFlowGateway,
};

#[actix_web::test]
async fn guest_checkout() {
    let db = test_db().await;
    let req = TestRequest::post().uri("/api/orders/public").set_json(checkout_request(10_000));
    let res = send_request(&db, MockFlowGateway::new(), req).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let body = res.json();
    let ticket = body["ticket_id"].as_str().expect("No ticket id in response");
    assert!(ticket.starts_with("FK-"), "{ticket}");
    assert_eq!(body["order"]["ticket_id"], ticket);
    assert_eq!(body["order"]["status"], "pending");
    assert!(body["order"]["customer_id"].is_null());
    assert_eq!(body["order"]["total"], 10_000);
}

#[actix_web::test]
async fn customer_checkout_links_the_order_to_the_caller() {
    let db = test_db().await;
    let token = valid_token(42, Role::User);
    let req = with_bearer(TestRequest::post().uri("/api/orders"), &token).set_json(checkout_request(10_000));
    let res = send_request(&db, MockFlowGateway::new(), req).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.json()["order"]["customer_id"], 42);
}

#[actix_web::test]
async fn customer_checkout_without_a_token() {
    let db = test_db().await;
    let req = TestRequest::post().uri("/api/orders").set_json(checkout_request(10_000));
    let res = send_request(&db, MockFlowGateway::new(), req).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, r#"{"error":"Authentication Error. No bearer token was provided."}"#);
}

#[actix_web::test]
async fn customer_checkout_with_a_bad_token() {
    let db = test_db().await;
    let expired = issue_token(42, Role::User, Utc::now() - Duration::hours(2));
    let req = with_bearer(TestRequest::post().uri("/api/orders"), &expired).set_json(checkout_request(10_000));
    let res = send_request(&db, MockFlowGateway::new(), req).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let mut forged = valid_token(42, Role::User);
    forged.replace_range(forged.len() - 6.., "AAAAAA");
    let req = with_bearer(TestRequest::post().uri("/api/orders"), &forged).set_json(checkout_request(10_000));
    let res = send_request(&db, MockFlowGateway::new(), req).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let req = with_bearer(TestRequest::post().uri("/api/orders"), "not-a-jwt").set_json(checkout_request(10_000));
    let res = send_request(&db, MockFlowGateway::new(), req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn checkout_with_a_wrong_total() {
    let db = test_db().await;
    let req = TestRequest::post().uri("/api/orders/public").set_json(checkout_request(9_000));
    let res = send_request(&db, MockFlowGateway::new(), req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let error = res.json()["error"].as_str().map(String::from).expect("No error message");
    assert!(error.contains("total"), "{error}");
}

#[actix_web::test]
async fn checkout_with_an_empty_cart() {
    let db = test_db().await;
    let mut request = checkout_request(0);
    request.items.clear();
    let req = TestRequest::post().uri("/api/orders/public").set_json(request);
    let res = send_request(&db, MockFlowGateway::new(), req).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}
