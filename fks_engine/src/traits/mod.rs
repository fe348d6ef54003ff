//! # Store and collaborator contracts
//!
//! This module defines the behaviour that backends and external collaborators need to expose in order to be driven
//! by the order lifecycle service.
//!
//! * [`OrderManagement`] persists orders, their line items and the sales ledger, and looks orders up by internal id,
//!   ticket id or gateway token.
//! * [`FulfillmentManagement`] persists dispatch records and handles the claim/complete workflow.
//! * [`PaymentGatewayDatabase`] is the highest level of behaviour. It adds the guarded state mutations that
//!   reconciliation relies on.
//! * [`PaymentGateway`] is the remote payment service, as seen by the lifecycle service.
//! * [`NotificationSink`] delivers receipts to buyers.
mod data_objects;
mod fulfillment_management;
mod notification_sink;
mod order_management;
mod payment_gateway;
mod payment_gateway_database;

pub use data_objects::{FulfillmentPage, Pagination, TransitionResult};
pub use fulfillment_management::FulfillmentManagement;
pub use notification_sink::{NotificationError, NotificationSink};
pub use order_management::OrderManagement;
pub use payment_gateway::{GatewayError, GatewayPaymentStatus, PaymentGateway, PaymentIntent, PaymentIntentRequest};
pub use payment_gateway_database::{PaymentGatewayDatabase, PaymentGatewayError};
