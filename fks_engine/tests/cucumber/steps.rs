use cucumber::{then, when};
use fks_common::{PaymentOutcome, Pesos};
use fks_engine::{
    db_types::{BuyerContact, Fulfillment, FulfillmentStatus, Handler, Order, OrderStatusType, ShippingAddress},
    order_objects::{Buyer, CheckoutItem, CheckoutRequest, PaymentRequest},
    DispatchApi,
    FulfillmentManagement,
    OrderManagement,
};

use crate::cucumber::StoreWorld;

fn contact(email: &str) -> BuyerContact {
    BuyerContact {
        email: email.into(),
        name: "Cliente Fukusuke".into(),
        tax_id: None,
        phone: Some("+56 9 8765 4321".into()),
    }
}

fn address(deliverable: bool) -> ShippingAddress {
    ShippingAddress {
        street: deliverable.then(|| "Los Leones".to_string()),
        number: Some("88".into()),
        locality: Some("Ñuñoa".into()),
        region: Some("Metropolitana".into()),
    }
}

fn outcome(value: &str) -> PaymentOutcome {
    match value {
        "successful" | "paid" => PaymentOutcome::Successful,
        "rejected" => PaymentOutcome::Rejected,
        "pending" => PaymentOutcome::Pending,
        _ => panic!("Unknown payment outcome {value}"),
    }
}

struct Cart {
    email: String,
    qty: i64,
    product: String,
    price: i64,
}

async fn check_out(world: &mut StoreWorld, alias: String, cart: Cart, ship: bool) {
    let Cart { email, qty, product, price } = cart;
    let item =
        CheckoutItem { product_ref: product.clone(), name: product, quantity: qty, unit_price: Pesos::from(price) };
    let request = CheckoutRequest {
        contact: contact(&email),
        items: vec![item],
        shipping_address: address(ship),
        total: Pesos::from(qty * price),
    };
    let result = world.api().create_order(request, Buyer::Guest).await.expect("Error creating order");
    world.system().tickets.insert(alias, result.ticket_id);
}

#[when(expr = "{word} checks out {int} x {word} at {int} pesos as order {word}")]
async fn checkout_with_delivery(
    world: &mut StoreWorld,
    email: String,
    qty: i64,
    product: String,
    price: i64,
    alias: String,
) {
    check_out(world, alias, Cart { email, qty, product, price }, true).await;
}

#[when(expr = "{word} checks out {int} x {word} at {int} pesos for pickup as order {word}")]
async fn checkout_for_pickup(
    world: &mut StoreWorld,
    email: String,
    qty: i64,
    product: String,
    price: i64,
    alias: String,
) {
    check_out(world, alias, Cart { email, qty, product, price }, false).await;
}

#[when(expr = "payment for order {word} starts with token {word} for {int} pesos")]
async fn begin_payment(world: &mut StoreWorld, alias: String, token: String, amount: i64) {
    let ticket = world.ticket(&alias);
    world.system().gateway.queue_token(&token);
    let result = world.api().begin_payment(PaymentRequest::new(ticket.as_str(), amount)).await;
    world.system().last_error = result.err();
}

#[when(expr = "the gateway reports {word} for token {word}")]
async fn gateway_reports(world: &mut StoreWorld, value: String, token: String) {
    world.system().gateway.set_outcome(&token, outcome(&value));
}

#[when(expr = "the gateway confirms token {word}")]
async fn confirmation_arrives(world: &mut StoreWorld, token: String) {
    let result = world.api().reconcile(&token).await;
    world.system().last_error = result.err();
}

#[when(expr = "the gateway confirms token {word} {int} times")]
async fn repeated_confirmations(world: &mut StoreWorld, token: String, times: usize) {
    for _ in 0..times {
        world.api().reconcile(&token).await.expect("Error reconciling payment");
    }
}

#[when(expr = "dispatcher {int} claims the delivery for order {word}")]
async fn claim_delivery(world: &mut StoreWorld, handler_id: i64, alias: String) {
    let fulfillment = fulfillment_for(world, &alias).await.expect("Order has no fulfillment record");
    let api = DispatchApi::new(world.api().db().clone());
    let handler = Handler { id: handler_id, email: None };
    let result = api.claim(fulfillment.id, &handler).await;
    world.system().last_error = result.err();
}

#[when(expr = "dispatcher {int} delivers order {word}")]
async fn complete_delivery(world: &mut StoreWorld, handler_id: i64, alias: String) {
    let fulfillment = fulfillment_for(world, &alias).await.expect("Order has no fulfillment record");
    let api = DispatchApi::new(world.api().db().clone());
    let result = api.complete(fulfillment.id, handler_id).await;
    world.system().last_error = result.err();
}

async fn order_for(world: &StoreWorld, alias: &str) -> Order {
    let ticket = world.ticket(alias);
    world
        .api()
        .db()
        .fetch_order_by_ticket_id(&ticket)
        .await
        .expect("Error fetching order")
        .unwrap_or_else(|| panic!("Order {ticket} does not exist"))
}

async fn fulfillment_for(world: &StoreWorld, alias: &str) -> Option<Fulfillment> {
    let order = order_for(world, alias).await;
    world.api().db().fetch_fulfillment_for_order(order.id).await.expect("Error fetching fulfillment")
}

#[then(expr = "order {word} has status {string}")]
async fn order_status(world: &mut StoreWorld, alias: String, status: String) {
    let order = order_for(world, &alias).await;
    let expected = status.parse::<OrderStatusType>().expect("Invalid order status");
    assert_eq!(order.status, expected, "Status is incorrect");
}

#[then(expr = "order {word} has a total of {int} pesos")]
async fn order_total(world: &mut StoreWorld, alias: String, total: i64) {
    let order = order_for(world, &alias).await;
    assert_eq!(order.total, Pesos::from(total), "Total is incorrect");
}

#[then(expr = "order {word} has a delivery that is {string}")]
async fn delivery_status(world: &mut StoreWorld, alias: String, status: String) {
    let fulfillment = fulfillment_for(world, &alias).await.expect("Order has no fulfillment record");
    let expected = match status.as_str() {
        "pending" => FulfillmentStatus::Pending,
        "assigned" => FulfillmentStatus::Assigned,
        "delivered" => FulfillmentStatus::Delivered,
        _ => panic!("Unknown fulfillment status {status}"),
    };
    assert_eq!(fulfillment.status, expected, "Fulfillment status is incorrect");
}

#[then(expr = "order {word} has no delivery")]
async fn no_delivery(world: &mut StoreWorld, alias: String) {
    assert!(fulfillment_for(world, &alias).await.is_none(), "Order should not have a fulfillment record");
}

#[then(expr = "order {word} is held by dispatcher {int}")]
async fn delivery_handler(world: &mut StoreWorld, alias: String, handler_id: i64) {
    let fulfillment = fulfillment_for(world, &alias).await.expect("Order has no fulfillment record");
    assert_eq!(fulfillment.handler_id, Some(handler_id));
}

#[then(expr = "the sales ledger has {int} entries")]
async fn ledger_size(world: &mut StoreWorld, count: usize) {
    let entries = world.api().db().fetch_sales_ledger(None, None).await.expect("Error fetching sales ledger");
    assert_eq!(entries.len(), count);
}

#[then(expr = "the last request failed with a {word} error")]
async fn last_error(world: &mut StoreWorld, code: String) {
    let err = world.system().last_error.take().expect("The last request succeeded");
    assert_eq!(err.code(), code, "Unexpected error: {err}");
}

#[then("the last request succeeded")]
async fn last_ok(world: &mut StoreWorld) {
    let err = world.system().last_error.take();
    assert!(err.is_none(), "Unexpected error: {err:?}");
}
