use thiserror::Error;

use crate::{
    db_types::{GatewayToken, NewFulfillment, Order, OrderStatusType, TicketId},
    traits::{FulfillmentManagement, OrderManagement, TransitionResult},
};

/// This trait defines the highest level of behaviour for backends supporting the order lifecycle service.
///
/// Every state mutation the reconciliation flow performs goes through this trait, and each one is guarded so that
/// concurrent callers acting on the same order cannot both succeed.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayDatabase: Clone + OrderManagement + FulfillmentManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Records the gateway token on the order. First writer wins:
    /// * If the order has no token yet, `token` is stored and the updated order returned.
    /// * If the order already carries `token`, this is a no-op and the order is returned as is.
    /// * If the order carries a different token, [`PaymentGatewayError::TokenConflict`] is returned and the stored
    ///   token is left alone.
    async fn assign_gateway_token(&self, order_id: i64, token: &GatewayToken) -> Result<Order, PaymentGatewayError>;

    /// Moves the order to `to`, provided its current status is one of `from`.
    ///
    /// The status check and the write are a single compare-and-set, executed in the same transaction as the insert of
    /// `fulfillment` (if given). Exactly one of any number of concurrent callers observes
    /// [`TransitionResult::Applied`]; the rest get [`TransitionResult::Unchanged`] with the order's current state.
    async fn transition_order(
        &self,
        order_id: i64,
        from: &[OrderStatusType],
        to: OrderStatusType,
        fulfillment: Option<NewFulfillment>,
    ) -> Result<TransitionResult, PaymentGatewayError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), PaymentGatewayError>;
}

#[derive(Debug, Clone, Error)]
pub enum PaymentGatewayError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Ticket id {0} is already in use")]
    TicketIdCollision(TicketId),
    #[error("Order {ticket_id} already has gateway token {existing}. Refusing to replace it with {attempted}")]
    TokenConflict { ticket_id: TicketId, existing: GatewayToken, attempted: GatewayToken },
    #[error("Gateway token {0} is already attached to a different order")]
    TokenAlreadyInUse(GatewayToken),
    #[error("Order #{0} already has a fulfillment record")]
    DuplicateFulfillment(i64),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(TicketId),
    #[error("Fulfillment #{0} does not exist")]
    FulfillmentNotFound(i64),
    #[error("Fulfillment #{0} has already been claimed")]
    FulfillmentAlreadyClaimed(i64),
    #[error("Fulfillment #{id} is not assigned to handler {handler_id}")]
    FulfillmentNotAssignedTo { id: i64, handler_id: i64 },
    #[error("Fulfillment #{0} is not out for delivery")]
    FulfillmentNotAssigned(i64),
}

impl From<sqlx::Error> for PaymentGatewayError {
    fn from(e: sqlx::Error) -> Self {
        PaymentGatewayError::DatabaseError(e.to_string())
    }
}
