//! Adapters that let concrete payment gateways act as a [`crate::traits::PaymentGateway`].
mod flow;
