//! # SQLite backend
//!
//! [`SqliteDatabase`] implements the store contracts on top of a `sqlx` connection pool.
//!
//! The "low-level" interactions live in the `orders`, `fulfillments` and `sales_ledger` modules. They are simple
//! functions (rather than stateful structs) that accept a `&mut SqliteConnection` argument. Callers can obtain a
//! connection from the pool, or open a transaction and pass `&mut *tx`, without any other changes.
use std::{str::FromStr, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod fulfillments;
pub mod orders;
pub mod sales_ledger;
mod sqlite_impl;

pub use sqlite_impl::SqliteDatabase;

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens a pool in WAL mode. Writers queue on the busy timeout rather than failing immediately, which is what the
/// compare-and-set transitions rely on when several reconciliations race for the same order.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
