use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Fulfillment, Handler},
    fks_api::errors::OrderFlowError,
    traits::{FulfillmentPage, Pagination, PaymentGatewayDatabase},
};

/// The dispatch workflow: dispatchers browse fulfillment records, claim one, and mark it delivered.
pub struct DispatchApi<B> {
    db: B,
}

impl<B> Debug for DispatchApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DispatchApi")
    }
}

impl<B> DispatchApi<B>
where B: PaymentGatewayDatabase
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn fulfillments(&self, page: Pagination) -> Result<FulfillmentPage, OrderFlowError> {
        let page = self.db.fetch_fulfillments(page).await?;
        trace!("🚚️ Fetched {} of {} fulfillment records", page.items.len(), page.total);
        Ok(page)
    }

    pub async fn fulfillment(&self, id: i64) -> Result<Fulfillment, OrderFlowError> {
        self.db
            .fetch_fulfillment(id)
            .await?
            .ok_or_else(|| OrderFlowError::NotFound(format!("Fulfillment #{id} does not exist")))
    }

    /// The records the handler has claimed, most recent first.
    pub async fn fulfillments_for_handler(&self, handler_id: i64) -> Result<Vec<Fulfillment>, OrderFlowError> {
        let result = self.db.fetch_fulfillments_for_handler(handler_id).await?;
        Ok(result)
    }

    /// Claims a pending record for `handler`. If someone else got there first, a `Conflict` is returned.
    pub async fn claim(&self, id: i64, handler: &Handler) -> Result<Fulfillment, OrderFlowError> {
        let fulfillment = self.db.claim_fulfillment(id, handler).await.map_err(|e| {
            debug!("🚚️ Handler {} could not claim fulfillment #{id}. {e}", handler.id);
            e
        })?;
        info!("🚚️ Fulfillment #{id} (order #{}) is out for delivery with handler {}", fulfillment.order_id, handler.id);
        Ok(fulfillment)
    }

    /// Marks a record as delivered. Only the handler that claimed it can do this.
    pub async fn complete(&self, id: i64, handler_id: i64) -> Result<Fulfillment, OrderFlowError> {
        let fulfillment = self.db.complete_fulfillment(id, handler_id).await?;
        info!("🚚️ Fulfillment #{id} (order #{}) has been delivered", fulfillment.order_id);
        Ok(fulfillment)
    }
}
