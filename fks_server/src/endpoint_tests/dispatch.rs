use actix_web::{http::StatusCode, test::TestRequest};
use fks_engine::{db_types::Role, test_utils::MockGateway};

use super::helpers::{paid_fulfillment, send_request, test_db, valid_token, with_bearer};

#[actix_web::test]
async fn dispatch_requires_a_token() {
    let db = test_db().await;
    let res = send_request(&db, MockGateway::new(), TestRequest::get().uri("/api/dispatch")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn customers_cannot_dispatch() {
    let db = test_db().await;
    let record = paid_fulfillment(&db, "tok-acl").await;
    let token = valid_token(42, Role::User);
    let res = send_request(&db, MockGateway::new(), with_bearer(TestRequest::get().uri("/api/dispatch"), &token)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(
        res.body,
        r#"{"error":"Authentication Error. Insufficient Permissions. Requires one of: admin, dispatcher"}"#
    );
    let req = with_bearer(TestRequest::post().uri(&format!("/api/dispatch/{}/claim", record.id)), &token);
    let res = send_request(&db, MockGateway::new(), req).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn listing_fulfillments() {
    let db = test_db().await;
    let mut tickets = Vec::new();
    for i in 0..3 {
        tickets.push(paid_fulfillment(&db, &format!("tok-list-{i}")).await.ticket_id);
    }
    let token = valid_token(7, Role::Admin);
    let req = with_bearer(TestRequest::get().uri("/api/dispatch?page=1&limit=2"), &token);
    let res = send_request(&db, MockGateway::new(), req).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["total"], 3);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["items"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(body["items"][0]["status"], "pending");
    assert_eq!(body["items"][0]["ticket_id"], tickets[2].as_str());
    assert_eq!(body["items"][0]["contact_name"], "Ana Tanaka");
    assert_eq!(body["items"][0]["contact_email"], "a@b.com");

    let req = with_bearer(TestRequest::get().uri("/api/dispatch"), &token);
    let res = send_request(&db, MockGateway::new(), req).await;
    assert_eq!(res.json()["items"].as_array().map(|a| a.len()), Some(3));
}

#[actix_web::test]
async fn claiming_and_completing_a_delivery() {
    let db = test_db().await;
    let record = paid_fulfillment(&db, "tok-deliver").await;
    let rider = valid_token(5, Role::Dispatcher);

    let claim = format!("/api/dispatch/{}/claim", record.id);
    let res = send_request(&db, MockGateway::new(), with_bearer(TestRequest::post().uri(&claim), &rider)).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["status"], "assigned");
    assert_eq!(body["handler_id"], 5);
    assert_eq!(body["handler_email"], "user5@fukusuke.cl");

    let req = with_bearer(TestRequest::get().uri("/api/dispatch/mine"), &rider);
    let res = send_request(&db, MockGateway::new(), req).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()[0]["id"], record.id);

    let complete = format!("/api/dispatch/{}/complete", record.id);
    let res = send_request(&db, MockGateway::new(), with_bearer(TestRequest::post().uri(&complete), &rider)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["status"], "delivered");
}

#[actix_web::test]
async fn claims_and_completions_are_guarded() {
    let db = test_db().await;
    let record = paid_fulfillment(&db, "tok-guard").await;
    let rider = valid_token(5, Role::Dispatcher);
    let other = valid_token(6, Role::Dispatcher);
    let claim = format!("/api/dispatch/{}/claim", record.id);
    let complete = format!("/api/dispatch/{}/complete", record.id);

    let res = send_request(&db, MockGateway::new(), with_bearer(TestRequest::post().uri(&complete), &rider)).await;
    assert_eq!(res.status, StatusCode::CONFLICT, "Unclaimed records cannot be completed");

    let res = send_request(&db, MockGateway::new(), with_bearer(TestRequest::post().uri(&claim), &rider)).await;
    assert_eq!(res.status, StatusCode::OK);
    let res = send_request(&db, MockGateway::new(), with_bearer(TestRequest::post().uri(&claim), &other)).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    let res = send_request(&db, MockGateway::new(), with_bearer(TestRequest::post().uri(&complete), &other)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let req = with_bearer(TestRequest::post().uri("/api/dispatch/9999/claim"), &rider);
    let res = send_request(&db, MockGateway::new(), req).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
