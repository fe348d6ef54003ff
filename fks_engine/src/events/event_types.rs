use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Fulfillment, Order},
    order_objects::Receipt,
};

/// Published once per order, by the reconciliation call that moved it into `Paid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub receipt: Receipt,
    pub fulfillment: Option<Fulfillment>,
}

impl OrderPaidEvent {
    pub fn new(order: Order, receipt: Receipt, fulfillment: Option<Fulfillment>) -> Self {
        Self { order, receipt, fulfillment }
    }
}

/// Published once per order, by the reconciliation call that moved it into `Rejected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}
