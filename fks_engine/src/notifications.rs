//! Glue between the event hooks and a [`NotificationSink`].
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::{
    events::OrderPaidEvent,
    order_objects::Receipt,
    traits::{NotificationError, NotificationSink},
};

/// Adapts a sink into an `on_order_paid` hook.
///
/// Delivery failures are logged and dropped. They never reach the order state or the caller that triggered the
/// payment, and the hook does not retry.
pub fn receipt_hook<S>(sink: S) -> impl Fn(OrderPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync
where S: NotificationSink + Send + Sync + 'static {
    let sink = Arc::new(sink);
    move |event: OrderPaidEvent| -> Pin<Box<dyn Future<Output = ()> + Send>> {
        let sink = Arc::clone(&sink);
        Box::pin(async move {
            let ticket_id = event.receipt.ticket_id.clone();
            match sink.send_receipt(&event.receipt).await {
                Ok(()) => info!("📧️ Receipt for order {ticket_id} sent to {}", event.receipt.contact.email),
                Err(e) => error!("📧️ Could not send the receipt for order {ticket_id}. {e}"),
            }
        })
    }
}

/// A sink that writes receipts to the log instead of delivering them. Used when no mail service is configured.
#[derive(Debug, Clone, Default)]
pub struct LogOnlyNotifier;

impl NotificationSink for LogOnlyNotifier {
    async fn send_receipt(&self, receipt: &Receipt) -> Result<(), NotificationError> {
        info!(
            "📧️ [log only] Receipt for order {} ({} items, {}) would be sent to {}",
            receipt.ticket_id,
            receipt.items.len(),
            receipt.total,
            receipt.contact.email
        );
        Ok(())
    }
}
