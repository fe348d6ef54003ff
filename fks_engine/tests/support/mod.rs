#![allow(dead_code)]
use fks_common::{PaymentOutcome, Pesos};
use fks_engine::{
    db_types::{BuyerContact, ShippingAddress, TicketId},
    events::{EventHandlers, EventHooks},
    notifications::receipt_hook,
    order_objects::{Buyer, CheckoutItem, CheckoutRequest, PaymentRequest},
    test_utils::{prepare_env::fresh_database, MockGateway, RecordingSink},
    OrderFlowApi,
    PaymentGatewayDatabase,
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub type TestApi = OrderFlowApi<SqliteDatabase, MockGateway>;

pub struct TestSystem {
    pub api: TestApi,
    pub gateway: MockGateway,
    pub sink: RecordingSink,
    handlers: EventHandlers,
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_sink(RecordingSink::default()).await
    }

    pub async fn with_sink(sink: RecordingSink) -> Self {
        let db = fresh_database(5).await;
        let gateway = MockGateway::new();
        let mut hooks = EventHooks::default();
        hooks.on_order_paid(receipt_hook(sink.clone()));
        let handlers = EventHandlers::new(16, hooks);
        let api = OrderFlowApi::new(db, gateway.clone(), handlers.producers());
        Self { api, gateway, sink, handlers }
    }

    pub fn db(&self) -> &SqliteDatabase {
        self.api.db()
    }

    /// Checks out a two-roll order for 10,000 pesos.
    pub async fn place_order(&self, with_address: bool) -> TicketId {
        let result = self.api.create_order(checkout(with_address), Buyer::Guest).await.expect("Error creating order");
        result.ticket_id
    }

    /// Places an order and opens a payment session for it with the given token.
    pub async fn place_order_and_begin_payment(&self, token: &str, with_address: bool) -> TicketId {
        let ticket = self.place_order(with_address).await;
        self.gateway.queue_token(token);
        let intent =
            self.api.begin_payment(PaymentRequest::new(ticket.as_str(), 10_000)).await.expect("Error beginning payment");
        assert_eq!(intent.token.as_str(), token);
        ticket
    }

    pub fn gateway_reports(&self, token: &str, outcome: PaymentOutcome) {
        self.gateway.set_outcome(token, outcome);
    }

    /// Drops the API, and with it every event producer, then waits for the hooks to finish. Returns the sink so that
    /// the receipts can be inspected.
    pub async fn shut_down(self) -> RecordingSink {
        let TestSystem { mut api, sink, handlers, .. } = self;
        let url = api.db().url().to_string();
        if let Err(e) = api.db_mut().close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        drop(api);
        handlers.run_to_completion().await;
        if let Err(e) = Sqlite::drop_database(&url).await {
            warn!("🚀️ Could not remove test database {url}: {e}");
        }
        sink
    }
}

pub fn contact() -> BuyerContact {
    BuyerContact {
        email: "a@b.com".into(),
        name: "Ana Tanaka".into(),
        tax_id: Some("12.345.678-9".into()),
        phone: Some("+56 9 1234 5678".into()),
    }
}

pub fn address() -> ShippingAddress {
    ShippingAddress {
        street: Some("Av. Providencia".into()),
        number: Some("1234".into()),
        locality: Some("Providencia".into()),
        region: Some("Metropolitana".into()),
    }
}

pub fn item(product_ref: &str, quantity: i64, unit_price: i64) -> CheckoutItem {
    CheckoutItem {
        product_ref: product_ref.into(),
        name: format!("Roll {product_ref}"),
        quantity,
        unit_price: Pesos::from(unit_price),
    }
}

pub fn checkout(with_address: bool) -> CheckoutRequest {
    let shipping_address = if with_address { address() } else { ShippingAddress { street: None, ..address() } };
    CheckoutRequest {
        contact: contact(),
        items: vec![item("ebi-roll", 2, 5000)],
        shipping_address,
        total: Pesos::from(10_000),
    }
}
