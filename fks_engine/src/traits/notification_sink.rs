use std::future::Future;

use thiserror::Error;

use crate::order_objects::Receipt;

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Notification service is not configured. {0}")]
    NotConfigured(String),
    #[error("Could not deliver the notification. {0}")]
    DeliveryFailed(String),
}

/// Delivers a receipt to the buyer of a freshly paid order.
///
/// Sinks are called at most once per order. They own their retry policy, if they have one.
pub trait NotificationSink {
    fn send_receipt(&self, receipt: &Receipt) -> impl Future<Output = Result<(), NotificationError>> + Send;
}
