use crate::{
    db_types::{Fulfillment, Handler},
    traits::{FulfillmentPage, Pagination, PaymentGatewayError},
};

/// Persistence of dispatch records and the claim/complete workflow that consumes them.
///
/// Fulfillment records are only ever created by [`crate::PaymentGatewayDatabase::transition_order`], as a side
/// effect of an order's first transition into `Paid`.
#[allow(async_fn_in_trait)]
pub trait FulfillmentManagement {
    async fn fetch_fulfillment(&self, id: i64) -> Result<Option<Fulfillment>, PaymentGatewayError>;

    async fn fetch_fulfillment_for_order(&self, order_id: i64) -> Result<Option<Fulfillment>, PaymentGatewayError>;

    /// Newest first.
    async fn fetch_fulfillments(&self, page: Pagination) -> Result<FulfillmentPage, PaymentGatewayError>;

    async fn fetch_fulfillments_for_handler(&self, handler_id: i64) -> Result<Vec<Fulfillment>, PaymentGatewayError>;

    /// Assigns a pending fulfillment to `handler` and stamps the dispatch time.
    ///
    /// Only one handler can win: if the record is no longer pending, [`PaymentGatewayError::FulfillmentAlreadyClaimed`]
    /// is returned and nothing changes.
    async fn claim_fulfillment(&self, id: i64, handler: &Handler) -> Result<Fulfillment, PaymentGatewayError>;

    /// Marks an assigned fulfillment as delivered. Only the handler that claimed it may complete it.
    async fn complete_fulfillment(&self, id: i64, handler_id: i64) -> Result<Fulfillment, PaymentGatewayError>;
}
