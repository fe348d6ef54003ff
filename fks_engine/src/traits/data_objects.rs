use serde::{Deserialize, Serialize};

use crate::db_types::{Fulfillment, Order};

/// The result of a guarded status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// This caller moved the order to its new status. Any fulfillment record created alongside is included.
    Applied { order: Order, fulfillment: Option<Fulfillment> },
    /// The order was not in one of the expected source states, so nothing was written. This is the current order.
    Unchanged(Order),
}

impl TransitionResult {
    pub fn order(&self) -> &Order {
        match self {
            Self::Applied { order, .. } => order,
            Self::Unchanged(order) => order,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// One-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub limit: u32,
}

fn first_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: first_page(), limit: default_page_size() }
    }
}

impl Pagination {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Clamps the page to at least 1 and the limit to `1..=MAX_PAGE_SIZE`.
    pub fn normalized(self) -> Self {
        Self { page: self.page.max(1), limit: self.limit.clamp(1, MAX_PAGE_SIZE) }
    }

    pub fn offset(&self) -> i64 {
        let p = self.normalized();
        i64::from(p.page - 1) * i64::from(p.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentPage {
    pub items: Vec<Fulfillment>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

impl FulfillmentPage {
    pub fn total_pages(&self) -> i64 {
        if self.limit == 0 {
            return 0;
        }
        let limit = i64::from(self.limit);
        (self.total + limit - 1) / limit
    }
}
