use std::fmt::Display;

use chrono::{DateTime, Utc};
use fks_common::Pesos;
use serde::{Deserialize, Serialize};

use crate::db_types::{
    BuyerContact,
    Fulfillment,
    GatewayToken,
    LineItem,
    Order,
    OrderStatusType,
    ShippingAddress,
    TicketId,
};

//--------------------------------------       Checkout        ---------------------------------------------------------
/// One cart line as submitted by the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub product_ref: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Pesos,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub contact: BuyerContact,
    pub items: Vec<CheckoutItem>,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    /// The total the storefront computed. It must match the sum of the line items exactly.
    pub total: Pesos,
}

/// Who is placing the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Buyer {
    Guest,
    Customer(i64),
}

impl Buyer {
    pub fn customer_id(&self) -> Option<i64> {
        match self {
            Buyer::Guest => None,
            Buyer::Customer(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub ticket_id: TicketId,
    pub order: Order,
}

//--------------------------------------    Begin payment      ---------------------------------------------------------
/// A request to open a payment session for an order.
///
/// Both fields are kept loosely typed so that malformed input is reported as a validation error rather than a
/// deserialization failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub ticket_id: String,
    pub amount: serde_json::Number,
}

impl PaymentRequest {
    pub fn new<S: Into<String>>(ticket_id: S, amount: i64) -> Self {
        Self { ticket_id: ticket_id.into(), amount: serde_json::Number::from(amount) }
    }
}

//--------------------------------------       Receipt         ---------------------------------------------------------
/// Everything a buyer needs to see (or be emailed) once their order has been paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub ticket_id: TicketId,
    pub gateway_token: Option<GatewayToken>,
    pub contact: BuyerContact,
    pub items: Vec<LineItem>,
    pub total: Pesos,
    pub shipping_address: ShippingAddress,
    pub paid_at: DateTime<Utc>,
}

impl Receipt {
    pub fn new(order: &Order, items: Vec<LineItem>) -> Self {
        Self {
            ticket_id: order.ticket_id.clone(),
            gateway_token: order.gateway_token.clone(),
            contact: order.contact.clone(),
            items,
            total: order.total,
            shipping_address: order.shipping_address.clone(),
            paid_at: order.updated_at,
        }
    }
}

//--------------------------------------      Reconcile        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    /// The order as it stands after reconciliation.
    pub order: Order,
    /// True if this call changed the order's status.
    pub transitioned: bool,
    /// The order's fulfillment record, if it has one.
    pub fulfillment: Option<Fulfillment>,
    /// Receipt data, for paid orders.
    pub receipt: Option<Receipt>,
    /// Set when this call moved the order to `Paid` but could not create a fulfillment record because the order
    /// has no deliverable address.
    pub fulfillment_skipped: bool,
}

impl ReconcileOutcome {
    pub fn status(&self) -> OrderStatusType {
        self.order.status
    }
}

//--------------------------------------     OrderDetails      ---------------------------------------------------------
/// An order together with its line items. This is the full document shape that lookups return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<LineItem>,
}

//--------------------------------------   OrderQueryFilter    ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub ticket_id: Option<TicketId>,
    pub customer_id: Option<i64>,
    pub email: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<OrderStatusType>>,
}

impl OrderQueryFilter {
    pub fn with_ticket_id(mut self, ticket_id: TicketId) -> Self {
        self.ticket_id = Some(ticket_id);
        self
    }

    pub fn with_customer_id(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ticket_id.is_none() &&
            self.customer_id.is_none() &&
            self.email.is_none() &&
            self.status.iter().all(|s| s.is_empty()) &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(ticket_id) = &self.ticket_id {
            write!(f, "ticket_id: {ticket_id}. ")?;
        }
        if let Some(customer_id) = &self.customer_id {
            write!(f, "customer_id: {customer_id}. ")?;
        }
        if let Some(email) = &self.email {
            write!(f, "email: {email}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = self.status.as_ref().filter(|s| !s.is_empty()) {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: {statuses}. ")?;
        }
        Ok(())
    }
}
