use actix_web::{
    body::to_bytes,
    http::{header, StatusCode},
    test,
    test::TestRequest,
    web,
    App,
};
use chrono::{DateTime, Days, Utc};
use fks_common::{PaymentOutcome, Pesos};
use fks_engine::{
    db_types::{BuyerContact, Fulfillment, Role, ShippingAddress, TicketId},
    events::EventProducers,
    order_objects::{Buyer, CheckoutItem, CheckoutRequest, PaymentRequest},
    test_utils::{prepare_env::fresh_database, MockGateway},
    traits::PaymentGateway,
    DispatchApi,
    OrderFlowApi,
    SqliteDatabase,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use log::debug;

use crate::{
    auth::{JwtClaims, TokenVerifier},
    config::{AuthConfig, LandingPages},
    server::configure_routes,
};

// Signs the tokens used by these tests. DO NOT re-use this secret anywhere.
const TEST_JWT_SECRET: &str = "fks-endpoint-tests-3f9a1c";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_JWT_SECRET)
}

pub fn issue_token(user_id: i64, role: Role, expiry: DateTime<Utc>) -> String {
    let claims = JwtClaims {
        sub: user_id,
        role,
        email: Some(format!("user{user_id}@fukusuke.cl")),
        exp: expiry.timestamp() as u64,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()))
        .expect("Failed to sign token")
}

pub fn valid_token(user_id: i64, role: Role) -> String {
    issue_token(user_id, role, Utc::now() + Days::new(1))
}

pub fn landing_pages() -> LandingPages {
    LandingPages {
        success_url: "https://fukusuke.cl/pago/exito".into(),
        pending_url: "https://fukusuke.cl/pago/pendiente".into(),
        error_url: "https://fukusuke.cl/pago/error".into(),
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("Response body is not JSON")
    }
}

/// Sends `req` to an app built around `db` and `gateway`, with every route registered. Errors raised by middleware
/// are rendered the way the server would render them.
pub async fn send_request<G>(db: &SqliteDatabase, gateway: G, req: TestRequest) -> TestResponse
where G: PaymentGateway + 'static {
    let orders_api = OrderFlowApi::new(db.clone(), gateway, EventProducers::default());
    let app = App::new()
        .app_data(web::Data::new(orders_api))
        .app_data(web::Data::new(DispatchApi::new(db.clone())))
        .app_data(web::Data::new(TokenVerifier::new(&get_auth_config())))
        .app_data(web::Data::new(landing_pages()))
        .configure(configure_routes::<SqliteDatabase, G>);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.map_into_boxed_body().into_parts().1,
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let location = res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()).map(String::from);
    let bytes = to_bytes(res.into_body()).await.expect("Could not read response body");
    let body = String::from_utf8_lossy(&bytes).into_owned();
    TestResponse { status, location, body }
}

pub fn with_bearer(req: TestRequest, token: &str) -> TestRequest {
    req.insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
}

pub async fn test_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    fresh_database(2).await
}

pub fn checkout_request(total: i64) -> CheckoutRequest {
    CheckoutRequest {
        contact: BuyerContact {
            email: "a@b.com".into(),
            name: "Ana Tanaka".into(),
            tax_id: None,
            phone: Some("+56 9 1234 5678".into()),
        },
        items: vec![CheckoutItem {
            product_ref: "ebi-roll".into(),
            name: "Ebi roll".into(),
            quantity: 2,
            unit_price: Pesos::from(5000),
        }],
        shipping_address: ShippingAddress {
            street: Some("Av. Providencia".into()),
            number: Some("1234".into()),
            locality: Some("Providencia".into()),
            region: Some("Metropolitana".into()),
        },
        total: Pesos::from(total),
    }
}

/// Checks out a 10,000 peso order directly against the store, and opens a payment session for it under `token`.
pub async fn order_with_token(db: &SqliteDatabase, token: &str) -> TicketId {
    let gateway = MockGateway::new();
    let api = OrderFlowApi::new(db.clone(), gateway.clone(), EventProducers::default());
    let ticket = api.create_order(checkout_request(10_000), Buyer::Guest).await.expect("Error creating order").ticket_id;
    gateway.queue_token(token);
    api.begin_payment(PaymentRequest::new(ticket.as_str(), 10_000)).await.expect("Error beginning payment");
    ticket
}

/// A paid order's fulfillment record, ready to be claimed.
pub async fn paid_fulfillment(db: &SqliteDatabase, token: &str) -> Fulfillment {
    let gateway = MockGateway::new();
    let api = OrderFlowApi::new(db.clone(), gateway.clone(), EventProducers::default());
    let ticket = api.create_order(checkout_request(10_000), Buyer::Guest).await.expect("Error creating order").ticket_id;
    gateway.queue_token(token).set_outcome(token, PaymentOutcome::Successful);
    api.begin_payment(PaymentRequest::new(ticket.as_str(), 10_000)).await.expect("Error beginning payment");
    let outcome = api.reconcile(token).await.expect("Error reconciling payment");
    outcome.fulfillment.expect("Paid orders with an address have a fulfillment")
}
