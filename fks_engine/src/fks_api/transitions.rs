//! The reconciliation state machine.
//!
//! | From \ Outcome          | Successful | Rejected   | Pending                 |
//! |-------------------------|------------|------------|-------------------------|
//! | `pending`               | `paid`     | `rejected` | `awaiting_confirmation` |
//! | `awaiting_confirmation` | `paid`     | `rejected` | no-op                   |
//! | `paid`                  | no-op      | no-op      | no-op                   |
//! | `rejected`              | no-op      | no-op      | no-op                   |
//!
//! Only the move into `paid` carries side effects (fulfillment record, receipt). Those belong to whichever caller
//! wins the compare-and-set on the status column.
use fks_common::PaymentOutcome;

use crate::db_types::OrderStatusType::{self, AwaitingConfirmation, Paid, Pending, Rejected};

/// A guarded status change: move to `to`, but only from one of the `from` states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: &'static [OrderStatusType],
    pub to: OrderStatusType,
}

impl StatusChange {
    pub fn for_outcome(outcome: PaymentOutcome) -> Self {
        match outcome {
            PaymentOutcome::Successful => Self { from: &[Pending, AwaitingConfirmation], to: Paid },
            PaymentOutcome::Rejected => Self { from: &[Pending, AwaitingConfirmation], to: Rejected },
            PaymentOutcome::Pending => Self { from: &[Pending], to: AwaitingConfirmation },
        }
    }

    pub fn applies_to(&self, current: OrderStatusType) -> bool {
        self.from.contains(&current)
    }
}

/// The status an order in `current` ends up in after the gateway reports `outcome`.
pub fn next_status(current: OrderStatusType, outcome: PaymentOutcome) -> OrderStatusType {
    let change = StatusChange::for_outcome(outcome);
    if change.applies_to(current) {
        change.to
    } else {
        current
    }
}
