//! Data types that are stored in, and retrieved from, the order and fulfillment stores.
use std::{fmt::Display, str::FromStr, sync::OnceLock};

use chrono::{DateTime, Utc};
use fks_common::Pesos;
use log::error;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------       TicketId        ---------------------------------------------------------
/// The human-readable order reference shown to buyers, e.g. `FK-20250101-0042`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct TicketId(String);

fn ticket_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z]+-\d{8}-\d{4}$").unwrap_or_else(|e| unreachable!("{e}")))
}

impl TicketId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TicketId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if ticket_pattern().is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ConversionError(format!("'{s}' is not a valid ticket id")))
        }
    }
}

impl TryFrom<String> for TicketId {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TicketId> for String {
    fn from(value: TicketId) -> Self {
        value.0
    }
}

impl Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------     GatewayToken      ---------------------------------------------------------
/// The opaque token issued by the payment gateway for one payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct GatewayToken(String);

impl GatewayToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for GatewayToken {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            Err(ConversionError("A gateway token cannot be empty".into()))
        } else {
            Ok(Self(s.to_string()))
        }
    }
}

impl TryFrom<String> for GatewayToken {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GatewayToken> for String {
    fn from(value: GatewayToken) -> Self {
        value.0
    }
}

impl Display for GatewayToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been created. A payment session may or may not have been opened for it.
    Pending,
    /// The gateway has seen the payment but has not settled it yet.
    AwaitingConfirmation,
    /// The gateway has confirmed the payment.
    Paid,
    /// The gateway rejected the payment, or the buyer abandoned it.
    Rejected,
}

impl OrderStatusType {
    /// Returns true if no gateway report can move an order out of this state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Paid | Self::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Paid => "paid",
            Self::Rejected => "rejected",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "awaiting_confirmation" => Ok(Self::AwaitingConfirmation),
            "paid" => Ok(Self::Paid),
            "rejected" => Ok(Self::Rejected),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------     BuyerContact      ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct BuyerContact {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

//--------------------------------------   ShippingAddress     ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ShippingAddress {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl ShippingAddress {
    /// A courier needs at least a street to deliver to.
    pub fn is_deliverable(&self) -> bool {
        self.street.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
    }
}

impl Display for ShippingAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts = [&self.street, &self.number, &self.locality, &self.region]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.trim().is_empty())
            .collect::<Vec<_>>();
        write!(f, "{}", parts.join(", "))
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub ticket_id: TicketId,
    pub gateway_token: Option<GatewayToken>,
    pub customer_id: Option<i64>,
    #[sqlx(flatten)]
    pub contact: BuyerContact,
    pub total: Pesos,
    #[sqlx(flatten)]
    pub shipping_address: ShippingAddress,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       LineItem        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i64,
    pub order_id: i64,
    pub product_ref: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Pesos,
    pub subtotal: Pesos,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub product_ref: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Pesos,
    pub subtotal: Pesos,
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
/// A validated order, ready to be written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub ticket_id: TicketId,
    pub customer_id: Option<i64>,
    pub contact: BuyerContact,
    pub items: Vec<NewLineItem>,
    pub total: Pesos,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------   SalesLedgerEntry    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SalesLedgerEntry {
    pub id: i64,
    pub order_id: i64,
    pub ticket_id: TicketId,
    pub product_ref: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Pesos,
    pub subtotal: Pesos,
    pub sold_at: DateTime<Utc>,
}

//--------------------------------------  FulfillmentStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    /// Waiting for a dispatcher to pick it up
    Pending,
    /// A dispatcher has claimed it and is out for delivery
    Assigned,
    Delivered,
}

impl Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Assigned => write!(f, "assigned"),
            Self::Delivered => write!(f, "delivered"),
        }
    }
}

//--------------------------------------      Fulfillment      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Fulfillment {
    pub id: i64,
    pub order_id: i64,
    pub ticket_id: TicketId,
    pub contact_name: String,
    pub contact_email: String,
    #[sqlx(flatten)]
    pub address: ShippingAddress,
    pub contact_phone: Option<String>,
    pub handler_id: Option<i64>,
    pub handler_email: Option<String>,
    pub status: FulfillmentStatus,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFulfillment {
    pub order_id: i64,
    pub ticket_id: TicketId,
    pub contact_name: String,
    pub contact_email: String,
    pub address: ShippingAddress,
    pub contact_phone: Option<String>,
}

impl NewFulfillment {
    /// Copies the delivery details and the buyer's name and email out of the order. Returns `None` if the order has no usable address.
    pub fn for_order(order: &Order) -> Option<Self> {
        if !order.shipping_address.is_deliverable() {
            return None;
        }
        Some(Self {
            order_id: order.id,
            ticket_id: order.ticket_id.clone(),
            contact_name: order.contact.name.clone(),
            contact_email: order.contact.email.clone(),
            address: order.shipping_address.clone(),
            contact_phone: order.contact.phone.clone(),
        })
    }
}

/// The person who picks up a fulfillment and delivers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handler {
    pub id: i64,
    pub email: Option<String>,
}

//--------------------------------------         Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
    Dispatcher,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
            Role::Dispatcher => write!(f, "dispatcher"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "dispatcher" => Ok(Self::Dispatcher),
            _ => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}
