//! # Fukusuke storefront server
//! This crate hosts the HTTP surface of the storefront. It is responsible for:
//! * Accepting checkouts from signed-in customers and guests.
//! * Opening payment sessions at Flow, and reconciling Flow's verdict when the confirmation webhook fires or the
//!   buyer's browser comes back.
//! * Letting dispatchers claim and complete the deliveries that follow a successful payment.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/flow/confirmation`: Flow's server-to-server confirmation webhook. Always acknowledged.
//! * `/flow/return`: Where Flow sends the buyer's browser. Redirects to a landing page.
//! * `/api/...`: Checkout, payment, order lookup and dispatch. See [routes](routes/index.html).

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
