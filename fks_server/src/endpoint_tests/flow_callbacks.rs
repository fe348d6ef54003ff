use actix_web::{http::StatusCode, test::TestRequest};
use fks_common::{PaymentOutcome, Pesos};
use fks_engine::{
    db_types::{OrderStatusType, TicketId},
    traits::{FulfillmentManagement, GatewayError, GatewayPaymentStatus, OrderManagement},
    SqliteDatabase,
};

use super::{
    helpers::{order_with_token, send_request, test_db},
    mocks::MockFlowGateway,
};

const ACK: &str = r#"{"status":"received"}"#;

fn gateway_reporting(ticket: &TicketId, outcome: PaymentOutcome, times: usize) -> MockFlowGateway {
    let mut gateway = MockFlowGateway::new();
    let reference = ticket.to_string();
    gateway.expect_payment_status().times(times).returning(move |_| {
        Ok(GatewayPaymentStatus { outcome, order_reference: reference.clone(), amount: Some(Pesos::from(10_000)) })
    });
    gateway
}

async fn status_of(db: &SqliteDatabase, ticket: &TicketId) -> OrderStatusType {
    db.fetch_order_by_ticket_id(ticket).await.unwrap().expect("Order has gone missing").status
}

//----------------------------------------------   Confirmation webhook  -----------------------------------------------
#[actix_web::test]
async fn confirmation_settles_the_order() {
    let db = test_db().await;
    let ticket = order_with_token(&db, "tok-c1").await;
    let gateway = gateway_reporting(&ticket, PaymentOutcome::Successful, 1);
    let req = TestRequest::post().uri("/flow/confirmation").set_form([("token", "tok-c1")]);
    let res = send_request(&db, gateway, req).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, ACK);
    assert_eq!(status_of(&db, &ticket).await, OrderStatusType::Paid);

    // Flow repeats itself. The order is already settled, so the gateway is not asked again.
    let req = TestRequest::post().uri("/flow/confirmation").set_form([("token", "tok-c1")]);
    let res = send_request(&db, gateway_reporting(&ticket, PaymentOutcome::Successful, 0), req).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, ACK);
}

#[actix_web::test]
async fn confirmation_is_always_acknowledged() {
    let db = test_db().await;
    let ticket = order_with_token(&db, "tok-c2").await;

    // No token at all
    let res = send_request(&db, MockFlowGateway::new(), TestRequest::post().uri("/flow/confirmation")).await;
    assert_eq!((res.status, res.body.as_str()), (StatusCode::OK, ACK));

    // A token nobody has heard of
    let req = TestRequest::post().uri("/flow/confirmation").set_form([("token", "tok-unknown")]);
    let res = send_request(&db, MockFlowGateway::new(), req).await;
    assert_eq!((res.status, res.body.as_str()), (StatusCode::OK, ACK));

    // The gateway cannot be reached
    let mut gateway = MockFlowGateway::new();
    gateway.expect_payment_status().returning(|_| Err(GatewayError::Unavailable("timed out".into())));
    let req = TestRequest::post().uri("/flow/confirmation").set_form([("token", "tok-c2")]);
    let res = send_request(&db, gateway, req).await;
    assert_eq!((res.status, res.body.as_str()), (StatusCode::OK, ACK));
    assert_eq!(status_of(&db, &ticket).await, OrderStatusType::Pending);

    // The gateway vouches for a different order
    let other: TicketId = "FK-19990101-0000".parse().unwrap();
    let req = TestRequest::post().uri("/flow/confirmation").set_form([("token", "tok-c2")]);
    let res = send_request(&db, gateway_reporting(&other, PaymentOutcome::Successful, 1), req).await;
    assert_eq!((res.status, res.body.as_str()), (StatusCode::OK, ACK));
    assert_eq!(status_of(&db, &ticket).await, OrderStatusType::Pending);
}

#[actix_web::test]
async fn confirmation_accepts_a_query_token() {
    let db = test_db().await;
    let ticket = order_with_token(&db, "tok-c3").await;
    let gateway = gateway_reporting(&ticket, PaymentOutcome::Rejected, 1);
    let res = send_request(&db, gateway, TestRequest::post().uri("/flow/confirmation?token=tok-c3")).await;
    assert_eq!((res.status, res.body.as_str()), (StatusCode::OK, ACK));
    assert_eq!(status_of(&db, &ticket).await, OrderStatusType::Rejected);
}

//----------------------------------------------   Browser return  ----------------------------------------------------
#[actix_web::test]
async fn return_after_a_successful_payment() {
    let db = test_db().await;
    let ticket = order_with_token(&db, "tok-r1").await;
    let gateway = gateway_reporting(&ticket, PaymentOutcome::Successful, 1);
    let req = TestRequest::post().uri("/flow/return").set_form([("token", "tok-r1")]);
    let res = send_request(&db, gateway, req).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("https://fukusuke.cl/pago/exito?token=tok-r1"));
    assert_eq!(status_of(&db, &ticket).await, OrderStatusType::Paid);
}

#[actix_web::test]
async fn return_while_the_payment_is_pending() {
    let db = test_db().await;
    let ticket = order_with_token(&db, "tok-r2").await;
    let gateway = gateway_reporting(&ticket, PaymentOutcome::Pending, 1);
    let res = send_request(&db, gateway, TestRequest::get().uri("/flow/return?token=tok-r2")).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("https://fukusuke.cl/pago/pendiente?token=tok-r2"));
    assert_eq!(status_of(&db, &ticket).await, OrderStatusType::AwaitingConfirmation);
}

#[actix_web::test]
async fn return_after_a_rejected_payment() {
    let db = test_db().await;
    let ticket = order_with_token(&db, "tok-r3").await;
    let gateway = gateway_reporting(&ticket, PaymentOutcome::Rejected, 1);
    let req = TestRequest::post().uri("/flow/return").set_form([("token", "tok-r3")]);
    let res = send_request(&db, gateway, req).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("https://fukusuke.cl/pago/error?token=tok-r3&error=rejected"));
}

#[actix_web::test]
async fn return_failures_redirect_to_the_error_page() {
    let db = test_db().await;
    order_with_token(&db, "tok-r4").await;

    let req = TestRequest::post().uri("/flow/return").set_form([("token", "tok-nope")]);
    let res = send_request(&db, MockFlowGateway::new(), req).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("https://fukusuke.cl/pago/error?token=tok-nope&error=not_found"));

    let mut gateway = MockFlowGateway::new();
    gateway.expect_payment_status().returning(|_| Err(GatewayError::InvalidResponse("bad signature".into())));
    let req = TestRequest::post().uri("/flow/return").set_form([("token", "tok-r4")]);
    let res = send_request(&db, gateway, req).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("https://fukusuke.cl/pago/error?token=tok-r4&error=gateway"));

    let res = send_request(&db, MockFlowGateway::new(), TestRequest::post().uri("/flow/return")).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location.as_deref(), Some("https://fukusuke.cl/pago/error?error=validation"));
}

#[actix_web::test]
async fn webhook_and_return_agree() {
    let db = test_db().await;
    let ticket = order_with_token(&db, "tok-both").await;
    let req = TestRequest::post().uri("/flow/confirmation").set_form([("token", "tok-both")]);
    let res = send_request(&db, gateway_reporting(&ticket, PaymentOutcome::Successful, 1), req).await;
    assert_eq!(res.status, StatusCode::OK);

    // The return arrives second and finds the order settled. It must not ask the gateway again.
    let req = TestRequest::post().uri("/flow/return").set_form([("token", "tok-both")]);
    let res = send_request(&db, gateway_reporting(&ticket, PaymentOutcome::Successful, 0), req).await;
    assert_eq!(res.location.as_deref(), Some("https://fukusuke.cl/pago/exito?token=tok-both"));
    let order = db.fetch_order_by_ticket_id(&ticket).await.unwrap().expect("Order has gone missing");
    assert!(db.fetch_fulfillment_for_order(order.id).await.unwrap().is_some());
}
