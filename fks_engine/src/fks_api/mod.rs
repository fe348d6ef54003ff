//! The public-facing APIs of the engine.
//!
//! * [`order_flow_api::OrderFlowApi`] drives an order from checkout to a settled payment.
//! * [`dispatch_api::DispatchApi`] drives fulfillment records from pending to delivered.
pub mod dispatch_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod transitions;
