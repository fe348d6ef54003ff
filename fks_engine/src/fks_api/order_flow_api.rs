use std::{fmt::Debug, sync::Arc};

use chrono::Utc;
use fks_common::Pesos;
use log::*;

use crate::{
    db_types::{Fulfillment, GatewayToken, NewFulfillment, NewLineItem, NewOrder, Order, OrderStatusType, TicketId},
    events::{EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    fks_api::{
        errors::OrderFlowError,
        order_objects::{
            Buyer,
            CheckoutRequest,
            CheckoutResult,
            OrderDetails,
            PaymentRequest,
            Receipt,
            ReconcileOutcome,
        },
        transitions::{next_status, StatusChange},
    },
    helpers::{new_ticket_id, TicketGenerator},
    traits::{
        GatewayError,
        GatewayPaymentStatus,
        PaymentGateway,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        PaymentIntent,
        PaymentIntentRequest,
        TransitionResult,
    },
};

/// How many ticket ids to try before giving up on a checkout.
pub const MAX_TICKET_ATTEMPTS: usize = 3;

/// `OrderFlowApi` is the primary API for the order lifecycle: checkout, opening a payment session with the gateway,
/// and reconciling the gateway's verdict back onto the order.
///
/// The webhook and the browser return both funnel into [`Self::reconcile`]. It may be called any number of times, in
/// any order and concurrently, for the same token. The fulfillment record and the `OrderPaidEvent` are produced
/// exactly once per order, by the call that wins the status compare-and-set.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    ticket_generator: TicketGenerator,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers, ticket_generator: Arc::new(new_ticket_id) }
    }

    /// Replaces the ticket id generator.
    pub fn with_ticket_generator(mut self, generator: TicketGenerator) -> Self {
        self.ticket_generator = generator;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    /// Validates the cart and stores it as a new `Pending` order.
    ///
    /// The declared total must equal the sum of the recomputed line subtotals; it is never corrected silently.
    /// Ticket ids are random, so a collision with an existing order is possible. The store rejects it and a fresh id
    /// is tried, up to [`MAX_TICKET_ATTEMPTS`] times, after which a `Conflict` is returned.
    pub async fn create_order(&self, request: CheckoutRequest, buyer: Buyer) -> Result<CheckoutResult, OrderFlowError> {
        let items = validate_checkout(&request)?;
        let created_at = Utc::now();
        for attempt in 1..=MAX_TICKET_ATTEMPTS {
            let ticket_id = (self.ticket_generator)(created_at);
            let order = NewOrder {
                ticket_id,
                customer_id: buyer.customer_id(),
                contact: request.contact.clone(),
                items: items.clone(),
                total: request.total,
                shipping_address: request.shipping_address.clone(),
                created_at,
            };
            match self.db.insert_order(order).await {
                Ok(order) => {
                    info!("🔄️🛒️ Order {} created for {} ({})", order.ticket_id, order.contact.email, order.total);
                    return Ok(CheckoutResult { ticket_id: order.ticket_id.clone(), order });
                },
                Err(PaymentGatewayError::TicketIdCollision(id)) => {
                    warn!("🔄️🛒️ Ticket id {id} is taken (attempt {attempt} of {MAX_TICKET_ATTEMPTS})");
                },
                Err(e) => return Err(e.into()),
            }
        }
        Err(OrderFlowError::Conflict(format!(
            "Could not allocate a unique ticket id after {MAX_TICKET_ATTEMPTS} attempts. Please try again."
        )))
    }

    /// Opens a payment session with the gateway for the order, and records the session token on it.
    ///
    /// The amount must be a whole number of pesos, equal to the order total. The order must still be `Pending`.
    /// If the gateway fails, the order is not touched and the call can simply be repeated.
    pub async fn begin_payment(&self, request: PaymentRequest) -> Result<PaymentIntent, OrderFlowError> {
        let ticket_id = request
            .ticket_id
            .parse::<TicketId>()
            .map_err(|e| OrderFlowError::Validation(format!("A valid ticket id is required. {e}")))?;
        let amount = integer_amount(&request.amount)?;
        let order = self
            .db
            .fetch_order_by_ticket_id(&ticket_id)
            .await?
            .ok_or_else(|| OrderFlowError::NotFound(format!("Order {ticket_id} does not exist")))?;
        if order.status != OrderStatusType::Pending {
            return Err(OrderFlowError::Conflict(format!(
                "Order {ticket_id} is {} and cannot be paid for again",
                order.status
            )));
        }
        if amount != order.total {
            return Err(OrderFlowError::Validation(format!(
                "The payment amount ({amount}) does not match the order total ({})",
                order.total
            )));
        }
        let intent_request =
            PaymentIntentRequest { ticket_id: ticket_id.clone(), amount, email: order.contact.email.clone() };
        let intent = self.gateway.create_payment_intent(&intent_request).await.map_err(|e| {
            warn!("🔄️💳️ Could not open a payment session for order {ticket_id}. {e}");
            e
        })?;
        self.db.assign_gateway_token(order.id, &intent.token).await?;
        info!("🔄️💳️ Payment session {} opened for order {ticket_id}", intent.token);
        Ok(intent)
    }

    /// Asks the gateway for the authoritative status of the payment behind `token` and applies it to the order.
    ///
    /// Orders that are already `Paid` or `Rejected` are returned as they are, without consulting the gateway.
    /// Gateway failures leave the order unchanged and are retryable.
    pub async fn reconcile(&self, token: &str) -> Result<ReconcileOutcome, OrderFlowError> {
        let token = token
            .parse::<GatewayToken>()
            .map_err(|e| OrderFlowError::Validation(format!("A gateway token is required. {e}")))?;
        let order = self.fetch_order_for_token(&token).await?;
        if order.status.is_final() {
            debug!("🔄️🧾️ Order {} is already {}. Nothing to reconcile", order.ticket_id, order.status);
            return self.settled_outcome(order).await;
        }
        let status = self.gateway.payment_status(&token).await.map_err(|e| {
            warn!("🔄️🧾️ Could not fetch the payment status for order {}. {e}", order.ticket_id);
            e
        })?;
        check_gateway_status(&order, &status)?;
        trace!("🔄️🧾️ Gateway reports {} for order {}", status.outcome, order.ticket_id);
        if next_status(order.status, status.outcome) == order.status {
            debug!(
                "🔄️🧾️ Order {} is {}. The gateway report ({}) does not change it",
                order.ticket_id, order.status, status.outcome
            );
            return self.settled_outcome(order).await;
        }
        let change = StatusChange::for_outcome(status.outcome);
        let becomes_paid = change.to == OrderStatusType::Paid;
        // Line items never change after checkout, so the receipt can be prepared before the guarded write.
        let items = if becomes_paid { self.db.fetch_line_items(order.id).await? } else { Vec::new() };
        let fulfillment = if becomes_paid { NewFulfillment::for_order(&order) } else { None };
        let fulfillment_skipped = becomes_paid && fulfillment.is_none();
        match self.db.transition_order(order.id, change.from, change.to, fulfillment).await? {
            TransitionResult::Applied { order, fulfillment } => {
                let mut outcome = ReconcileOutcome {
                    order,
                    transitioned: true,
                    fulfillment,
                    receipt: None,
                    fulfillment_skipped: false,
                };
                match outcome.order.status {
                    OrderStatusType::Paid => {
                        if fulfillment_skipped {
                            warn!(
                                "🔄️🧾️ Order {} is paid, but it has no deliverable address. No fulfillment record was \
                                 created. Follow up with the buyer at {}",
                                outcome.order.ticket_id, outcome.order.contact.email
                            );
                        }
                        let receipt = Receipt::new(&outcome.order, items);
                        info!("🔄️🧾️ Order {} is paid", outcome.order.ticket_id);
                        self.call_order_paid_hook(&outcome.order, &receipt, &outcome.fulfillment).await;
                        outcome.receipt = Some(receipt);
                        outcome.fulfillment_skipped = fulfillment_skipped;
                    },
                    OrderStatusType::Rejected => {
                        info!("🔄️🧾️ Payment for order {} was rejected", outcome.order.ticket_id);
                        self.call_order_annulled_hook(&outcome.order).await;
                    },
                    status => debug!("🔄️🧾️ Order {} is now {status}", outcome.order.ticket_id),
                }
                Ok(outcome)
            },
            TransitionResult::Unchanged(order) => {
                debug!(
                    "🔄️🧾️ Order {} is {}. The gateway report ({}) does not change it",
                    order.ticket_id, order.status, status.outcome
                );
                self.settled_outcome(order).await
            },
        }
    }

    /// Fetches the order (with its line items) that carries the given gateway token.
    pub async fn order_by_token(&self, token: &str) -> Result<OrderDetails, OrderFlowError> {
        let token = token
            .parse::<GatewayToken>()
            .map_err(|e| OrderFlowError::Validation(format!("A gateway token is required. {e}")))?;
        let order = self.fetch_order_for_token(&token).await?;
        let items = self.db.fetch_line_items(order.id).await?;
        Ok(OrderDetails { order, items })
    }

    async fn fetch_order_for_token(&self, token: &GatewayToken) -> Result<Order, OrderFlowError> {
        self.db.fetch_order_by_token(token).await?.ok_or_else(|| {
            warn!("🔄️🧾️ No order carries gateway token {token}");
            OrderFlowError::NotFound(format!("No order is associated with gateway token {token}"))
        })
    }

    /// The outcome for a call that did not change the order.
    async fn settled_outcome(&self, order: Order) -> Result<ReconcileOutcome, OrderFlowError> {
        let (fulfillment, receipt) = if order.status == OrderStatusType::Paid {
            let fulfillment = self.db.fetch_fulfillment_for_order(order.id).await?;
            let items = self.db.fetch_line_items(order.id).await?;
            (fulfillment, Some(Receipt::new(&order, items)))
        } else {
            (None, None)
        };
        Ok(ReconcileOutcome { order, transitioned: false, fulfillment, receipt, fulfillment_skipped: false })
    }

    async fn call_order_paid_hook(&self, order: &Order, receipt: &Receipt, fulfillment: &Option<Fulfillment>) {
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️📦️ Notifying order paid hook subscribers");
            let event = OrderPaidEvent::new(order.clone(), receipt.clone(), fulfillment.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_annulled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_annulled_producer {
            debug!("🔄️📦️ Notifying order annulled hook subscribers");
            emitter.publish_event(OrderAnnulledEvent::new(order.clone())).await;
        }
    }
}

/// Checks the cart and computes its line items. Every subtotal is recomputed from quantity and unit price.
pub fn validate_checkout(request: &CheckoutRequest) -> Result<Vec<NewLineItem>, OrderFlowError> {
    let invalid = |msg: String| OrderFlowError::Validation(msg);
    let contact = &request.contact;
    if contact.email.trim().is_empty() {
        return Err(invalid("A contact email is required".into()));
    }
    if !is_plausible_email(contact.email.trim()) {
        return Err(invalid(format!("'{}' is not a valid email address", contact.email)));
    }
    if contact.name.trim().is_empty() {
        return Err(invalid("A contact name is required".into()));
    }
    if request.items.is_empty() {
        return Err(invalid("An order must have at least one item".into()));
    }
    let mut sum = Pesos::default();
    let mut items = Vec::with_capacity(request.items.len());
    for (i, item) in request.items.iter().enumerate() {
        let n = i + 1;
        if item.product_ref.trim().is_empty() {
            return Err(invalid(format!("Item {n} has no product reference")));
        }
        if item.name.trim().is_empty() {
            return Err(invalid(format!("Item {n} has no name")));
        }
        if item.quantity < 1 {
            return Err(invalid(format!("Item {n} must have a quantity of at least 1")));
        }
        if item.unit_price.value() < 0 {
            return Err(invalid(format!("Item {n} has a negative unit price")));
        }
        let subtotal = item
            .unit_price
            .checked_mul(item.quantity)
            .ok_or_else(|| invalid(format!("The subtotal for item {n} is too large")))?;
        sum = sum.checked_add(subtotal).ok_or_else(|| invalid("The order total is too large".into()))?;
        items.push(NewLineItem {
            product_ref: item.product_ref.trim().to_string(),
            name: item.name.trim().to_string(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            subtotal,
        });
    }
    if sum != request.total {
        return Err(invalid(format!(
            "The declared total ({}) does not match the sum of the items ({sum})",
            request.total
        )));
    }
    if !sum.is_positive() {
        return Err(invalid("The order total must be positive".into()));
    }
    Ok(items)
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        },
        None => false,
    }
}

/// Payment amounts must be whole, positive numbers of pesos. `10000.0` is accepted, `10000.5` is not.
fn integer_amount(amount: &serde_json::Number) -> Result<Pesos, OrderFlowError> {
    let pesos = match amount.as_i64() {
        Some(v) => Pesos::from(v),
        None => amount.as_f64().and_then(|f| Pesos::try_from(f).ok()).ok_or_else(|| {
            OrderFlowError::Validation(format!("The payment amount must be a whole number of pesos, not {amount}"))
        })?,
    };
    if !pesos.is_positive() {
        return Err(OrderFlowError::Validation(format!("The payment amount must be positive, not {amount}")));
    }
    Ok(pesos)
}

/// The gateway's answer must be about this order, and a successful payment must be for the full amount.
fn check_gateway_status(order: &Order, status: &GatewayPaymentStatus) -> Result<(), OrderFlowError> {
    if status.order_reference != order.ticket_id.as_str() {
        error!(
            "🔄️🧾️ The gateway reports token {:?} belongs to '{}', but we have it on order {}",
            order.gateway_token, status.order_reference, order.ticket_id
        );
        return Err(GatewayError::InvalidResponse(format!(
            "Payment reference '{}' does not match order {}",
            status.order_reference, order.ticket_id
        ))
        .into());
    }
    if let Some(amount) = status.amount {
        if amount != order.total && status.outcome == fks_common::PaymentOutcome::Successful {
            error!(
                "🔄️🧾️ The gateway charged {amount} for order {}, but the order total is {}",
                order.ticket_id, order.total
            );
            return Err(GatewayError::InvalidResponse(format!(
                "Charged amount {amount} does not match the total of order {}",
                order.ticket_id
            ))
            .into());
        }
    }
    Ok(())
}
