//! # Flow payment gateway client
//!
//! A thin, typed client for the two Flow endpoints the storefront needs:
//! * `payment/create` opens a payment session and returns the URL the buyer is sent to, plus the session token.
//! * `payment/getStatus` is the authoritative source for the outcome of a payment session.
//!
//! Every request is signed with [`sign_params`]. Flow's numeric payment status codes are mapped to a
//! [`PaymentOutcome`] in exactly one place, [`FlowPaymentStatus::from_code`] followed by the `From` conversion into
//! [`PaymentOutcome`]. Do not interpret raw status codes anywhere else.
mod api;
mod config;
mod data_objects;
mod error;
mod signature;

pub use api::FlowApi;
pub use config::FlowConfig;
pub use data_objects::{FlowPaymentStatus, NewPaymentRequest, PaymentCreated, PaymentStatusResponse};
pub use error::FlowApiError;
pub use fks_common::PaymentOutcome;
pub use signature::{sign_params, SIGNATURE_PARAM};
