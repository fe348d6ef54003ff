//! Lifecycle events and the hook system that delivers them.
//!
//! The lifecycle service publishes events only after the state change behind them has been committed, and only from
//! the call that made the change. Subscribers therefore see each event once per order.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
