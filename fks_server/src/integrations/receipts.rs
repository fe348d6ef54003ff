use std::{future::Future, pin::Pin};

use fks_engine::{
    events::{EventHandlers, EventHooks, OrderAnnulledEvent},
    notifications::{receipt_hook, LogOnlyNotifier},
};
use log::*;

use crate::integrations::mailjet::{MailjetConfig, MailjetNotifier};

pub const RECEIPT_EVENT_BUFFER_SIZE: usize = 25;

/// Builds the lifecycle event handlers for the server.
///
/// * `OrderPaid` sends the buyer a receipt, through Mailjet if it is configured, or to the log otherwise.
/// * `OrderAnnulled` is logged for the shop staff.
pub fn create_receipt_event_handlers(mailjet: Option<MailjetConfig>) -> EventHandlers {
    let mut hooks = EventHooks::default();
    match mailjet {
        Some(config) => match MailjetNotifier::new(config) {
            Ok(notifier) => {
                info!("📧️ Receipts will be emailed through Mailjet as {}", notifier.sender_email());
                hooks.on_order_paid(receipt_hook(notifier));
            },
            Err(e) => {
                error!("📧️ {e}. Receipts will only be written to the log.");
                hooks.on_order_paid(receipt_hook(LogOnlyNotifier));
            },
        },
        None => {
            hooks.on_order_paid(receipt_hook(LogOnlyNotifier));
        },
    }
    hooks.on_order_annulled(|ev: OrderAnnulledEvent| -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            info!(
                "📬️ Payment for order {} ({}, {}) was rejected by the gateway",
                ev.order.ticket_id, ev.order.contact.email, ev.order.total
            );
        })
    });
    EventHandlers::new(RECEIPT_EVENT_BUFFER_SIZE, hooks)
}
