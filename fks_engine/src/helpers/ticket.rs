use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::db_types::TicketId;

pub const TICKET_PREFIX: &str = "FK";

/// Produces candidate ticket ids. Candidates are not guaranteed to be unique; the order store has the final say.
pub type TicketGenerator = Arc<dyn Fn(DateTime<Utc>) -> TicketId + Send + Sync>;

/// Generates a ticket id of the form `FK-YYYYMMDD-NNNN`, using the UTC date of `now` and a random 4-digit suffix.
pub fn new_ticket_id(now: DateTime<Utc>) -> TicketId {
    let suffix = rand::thread_rng().gen_range(0..10_000u32);
    let candidate = format!("{TICKET_PREFIX}-{}-{suffix:04}", now.format("%Y%m%d"));
    candidate.parse().unwrap_or_else(|e| unreachable!("Generated ticket id is malformed. {e}"))
}
