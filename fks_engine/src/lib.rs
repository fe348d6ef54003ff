//! Fukusuke order engine
//!
//! This library holds the order lifecycle of the Fukusuke storefront: checkout, payment sessions with the gateway,
//! reconciliation of the gateway's verdict, and the fulfillment records that follow a successful payment. It is
//! independent of the HTTP layer.
//!
//! The library is divided into these main sections:
//! 1. Database management and control. SQLite is the supported backend. Callers should not need to touch the
//!    database directly; use the APIs instead. The exception is the data types, which live in [`db_types`].
//! 2. The contracts that backends and external collaborators implement ([`traits`]).
//! 3. The public API ([`OrderFlowApi`], [`DispatchApi`]).
//!
//! The engine also emits events when an order is paid or rejected. A small actor-style hook system
//! ([`events`]) lets you subscribe to these, e.g. to send receipts ([`notifications::receipt_hook`]).
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
#[cfg(feature = "flow")]
pub mod integrations;
pub mod notifications;
mod fks_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use fks_api::{
    dispatch_api::DispatchApi,
    errors::OrderFlowError,
    order_flow_api::{validate_checkout, OrderFlowApi, MAX_TICKET_ATTEMPTS},
    order_objects,
    transitions,
};
pub use traits::{
    FulfillmentManagement,
    NotificationSink,
    OrderManagement,
    PaymentGateway,
    PaymentGatewayDatabase,
    PaymentGatewayError,
};
