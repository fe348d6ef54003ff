use std::sync::{Arc, Mutex};

use crate::{
    order_objects::Receipt,
    traits::{NotificationError, NotificationSink},
};

/// A notification sink that remembers every receipt it was asked to send. It can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    receipts: Arc<Mutex<Vec<Receipt>>>,
    fail: bool,
}

impl RecordingSink {
    /// A sink that records each attempt, then reports a delivery failure.
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn receipts(&self) -> Vec<Receipt> {
        self.receipts.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.receipts.lock().map(|r| r.len()).unwrap_or_default()
    }
}

impl NotificationSink for RecordingSink {
    async fn send_receipt(&self, receipt: &Receipt) -> Result<(), NotificationError> {
        if let Ok(mut receipts) = self.receipts.lock() {
            receipts.push(receipt.clone());
        }
        if self.fail {
            Err(NotificationError::DeliveryFailed("the mail server is on fire".into()))
        } else {
            Ok(())
        }
    }
}
