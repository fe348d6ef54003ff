//! # Database backends
//!
//! Backends implement the contracts in [`crate::traits`]. SQLite is the only backend at present.
#[cfg(feature = "sqlite")]
pub mod sqlite;
