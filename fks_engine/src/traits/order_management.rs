use chrono::{DateTime, Utc};

use crate::{
    db_types::{GatewayToken, LineItem, NewOrder, Order, SalesLedgerEntry, TicketId},
    order_objects::OrderQueryFilter,
    traits::PaymentGatewayError,
};

/// Persistence and lookup of orders and their line items.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores the order, its line items and the matching sales ledger entries in a single atomic transaction.
    ///
    /// The order is created in the `Pending` state without a gateway token. If another order already carries the
    /// same ticket id, nothing is written and [`PaymentGatewayError::TicketIdCollision`] is returned.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError>;

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, PaymentGatewayError>;

    async fn fetch_order_by_ticket_id(&self, ticket_id: &TicketId) -> Result<Option<Order>, PaymentGatewayError>;

    async fn fetch_order_by_token(&self, token: &GatewayToken) -> Result<Option<Order>, PaymentGatewayError>;

    /// The line items of the order, in the order they were submitted.
    async fn fetch_line_items(&self, order_id: i64) -> Result<Vec<LineItem>, PaymentGatewayError>;

    /// Fetches orders matching every criterion in the filter. Results are sorted by creation time, oldest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, PaymentGatewayError>;

    /// Sales ledger entries recorded in the given (inclusive) time window.
    async fn fetch_sales_ledger(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<SalesLedgerEntry>, PaymentGatewayError>;
}
