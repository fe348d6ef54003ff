use actix_web::{http::StatusCode, test::TestRequest};
use fks_common::{PaymentOutcome, Pesos};
use fks_engine::{
    db_types::GatewayToken,
    traits::{GatewayError, GatewayPaymentStatus, PaymentIntent},
    SqliteDatabase,
};
use serde_json::json;

use super::{
    helpers::{checkout_request, order_with_token, send_request, test_db},
    mocks::MockFlowGateway,
};

async fn guest_order(db: &SqliteDatabase) -> String {
    let req = TestRequest::post().uri("/api/orders/public").set_json(checkout_request(10_000));
    let res = send_request(db, MockFlowGateway::new(), req).await;
    assert_eq!(res.status, StatusCode::CREATED);
    res.json()["ticket_id"].as_str().map(String::from).expect("No ticket id in response")
}

#[actix_web::test]
async fn begin_payment() {
    let db = test_db().await;
    let ticket = guest_order(&db).await;
    let mut gateway = MockFlowGateway::new();
    let expected = ticket.clone();
    gateway.expect_create_payment_intent().times(1).returning(move |req| {
        assert_eq!(req.ticket_id.as_str(), expected);
        assert_eq!(req.amount, Pesos::from(10_000));
        assert_eq!(req.email, "a@b.com");
        Ok(PaymentIntent {
            redirect_url: "https://sandbox.flow.cl/app/web/pay.php?token=tok123".into(),
            token: "tok123".parse::<GatewayToken>().unwrap(),
        })
    });
    let req = TestRequest::post().uri("/api/payments").set_json(json!({"ticket_id": ticket, "amount": 10000}));
    let res = send_request(&db, gateway, req).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["token"], "tok123");
    assert_eq!(body["redirect_url"], "https://sandbox.flow.cl/app/web/pay.php?token=tok123");
}

#[actix_web::test]
async fn begin_payment_rejects_bad_amounts() {
    let db = test_db().await;
    let ticket = guest_order(&db).await;
    for amount in [json!(10000.5), json!(9999)] {
        let mut gateway = MockFlowGateway::new();
        gateway.expect_create_payment_intent().never();
        let req = TestRequest::post().uri("/api/payments").set_json(json!({"ticket_id": ticket, "amount": amount}));
        let res = send_request(&db, gateway, req).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "amount {amount}");
    }
}

#[actix_web::test]
async fn begin_payment_for_an_unknown_ticket() {
    let db = test_db().await;
    let mut gateway = MockFlowGateway::new();
    gateway.expect_create_payment_intent().never();
    let req = TestRequest::post().uri("/api/payments").set_json(json!({"ticket_id": "FK-19990101-0000", "amount": 10}));
    let res = send_request(&db, gateway, req).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn begin_payment_when_the_gateway_is_down() {
    let db = test_db().await;
    let ticket = guest_order(&db).await;
    let mut gateway = MockFlowGateway::new();
    gateway
        .expect_create_payment_intent()
        .returning(|_| Err(GatewayError::Unavailable("connection refused".into())));
    let req = TestRequest::post().uri("/api/payments").set_json(json!({"ticket_id": ticket, "amount": 10000}));
    let res = send_request(&db, gateway, req).await;
    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    assert!(res.json()["error"].as_str().unwrap_or_default().contains("connection refused"));
}

#[actix_web::test]
async fn order_by_token() {
    let db = test_db().await;
    let ticket = order_with_token(&db, "tok-lookup").await;
    let mut gateway = MockFlowGateway::new();
    gateway.expect_payment_status().never();
    let res = send_request(&db, gateway, TestRequest::get().uri("/api/orders/by-token/tok-lookup")).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["ticket_id"], ticket.as_str());
    assert_eq!(body["gateway_token"], "tok-lookup");
    assert_eq!(body["items"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(body["items"][0]["subtotal"], 10_000);

    let res = send_request(&db, MockFlowGateway::new(), TestRequest::get().uri("/api/orders/by-token/nope")).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn order_lookups_reflect_reconciliation() {
    let db = test_db().await;
    let ticket = order_with_token(&db, "tok-after").await;
    let mut gateway = MockFlowGateway::new();
    let reference = ticket.to_string();
    gateway.expect_payment_status().times(1).returning(move |_| {
        Ok(GatewayPaymentStatus {
            outcome: PaymentOutcome::Successful,
            order_reference: reference.clone(),
            amount: Some(Pesos::from(10_000)),
        })
    });
    let req = TestRequest::post().uri("/flow/confirmation").set_form([("token", "tok-after")]);
    let res = send_request(&db, gateway, req).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = send_request(&db, MockFlowGateway::new(), TestRequest::get().uri("/api/orders/by-token/tok-after")).await;
    assert_eq!(res.json()["status"], "paid");
}
