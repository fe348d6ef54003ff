//! `SqliteDatabase` is a concrete implementation of an order lifecycle backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::{fulfillments, new_pool, orders, sales_ledger};
use crate::{
    db_types::{
        Fulfillment,
        GatewayToken,
        Handler,
        LineItem,
        NewFulfillment,
        NewOrder,
        Order,
        OrderStatusType,
        SalesLedgerEntry,
        TicketId,
    },
    order_objects::OrderQueryFilter,
    traits::{
        FulfillmentManagement,
        FulfillmentPage,
        OrderManagement,
        Pagination,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        TransitionResult,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let saved = orders::insert_order(&order, &mut tx).await?;
        orders::insert_line_items(saved.id, &order.items, &mut tx).await?;
        sales_ledger::record_sale(&saved, &order.items, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} has been saved in the DB with id {}", saved.ticket_id, saved.id);
        Ok(saved)
    }

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_ticket_id(&self, ticket_id: &TicketId) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_ticket_id(ticket_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_token(&self, token: &GatewayToken) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_token(token, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_line_items(&self, order_id: i64) -> Result<Vec<LineItem>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_line_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::search_orders(query, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_sales_ledger(
        &self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<SalesLedgerEntry>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let entries = sales_ledger::fetch_entries(since, until, &mut conn).await?;
        Ok(entries)
    }
}

impl FulfillmentManagement for SqliteDatabase {
    async fn fetch_fulfillment(&self, id: i64) -> Result<Option<Fulfillment>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let result = fulfillments::fetch_fulfillment(id, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_fulfillment_for_order(&self, order_id: i64) -> Result<Option<Fulfillment>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let result = fulfillments::fetch_fulfillment_for_order(order_id, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_fulfillments(&self, page: Pagination) -> Result<FulfillmentPage, PaymentGatewayError> {
        let page = page.normalized();
        let mut conn = self.pool.acquire().await?;
        let items = fulfillments::fetch_fulfillments(page, &mut conn).await?;
        let total = fulfillments::count_fulfillments(&mut conn).await?;
        Ok(FulfillmentPage { items, page: page.page, limit: page.limit, total })
    }

    async fn fetch_fulfillments_for_handler(&self, handler_id: i64) -> Result<Vec<Fulfillment>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        let result = fulfillments::fetch_fulfillments_for_handler(handler_id, &mut conn).await?;
        Ok(result)
    }

    async fn claim_fulfillment(&self, id: i64, handler: &Handler) -> Result<Fulfillment, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let claimed = fulfillments::claim(id, handler, &mut tx).await?;
        let result = match claimed {
            Some(f) => {
                debug!("🗃️ Fulfillment #{id} claimed by handler {}", handler.id);
                Ok(f)
            },
            None => match fulfillments::fetch_fulfillment(id, &mut tx).await? {
                Some(_) => Err(PaymentGatewayError::FulfillmentAlreadyClaimed(id)),
                None => Err(PaymentGatewayError::FulfillmentNotFound(id)),
            },
        };
        tx.commit().await?;
        result
    }

    async fn complete_fulfillment(&self, id: i64, handler_id: i64) -> Result<Fulfillment, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let completed = fulfillments::complete(id, handler_id, &mut tx).await?;
        let result = match completed {
            Some(f) => {
                debug!("🗃️ Fulfillment #{id} delivered by handler {handler_id}");
                Ok(f)
            },
            None => match fulfillments::fetch_fulfillment(id, &mut tx).await? {
                None => Err(PaymentGatewayError::FulfillmentNotFound(id)),
                Some(f) if f.handler_id.is_some() && f.handler_id != Some(handler_id) => {
                    Err(PaymentGatewayError::FulfillmentNotAssignedTo { id, handler_id })
                },
                Some(_) => Err(PaymentGatewayError::FulfillmentNotAssigned(id)),
            },
        };
        tx.commit().await?;
        result
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn assign_gateway_token(&self, order_id: i64, token: &GatewayToken) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        // The conditional write comes first so that this transaction takes the write lock before it reads anything.
        if let Some(order) = orders::set_token_if_unset(order_id, token, &mut tx).await? {
            tx.commit().await?;
            debug!("🗃️ Gateway token {token} assigned to order {}", order.ticket_id);
            return Ok(order);
        }
        let order =
            orders::fetch_order_by_id(order_id, &mut tx).await?.ok_or(PaymentGatewayError::OrderIdNotFound(order_id))?;
        tx.commit().await?;
        match &order.gateway_token {
            Some(existing) if existing == token => {
                trace!("🗃️ Order {} already carries token {token}. Nothing to do", order.ticket_id);
                Ok(order)
            },
            Some(existing) => Err(PaymentGatewayError::TokenConflict {
                ticket_id: order.ticket_id.clone(),
                existing: existing.clone(),
                attempted: token.clone(),
            }),
            None => {
                error!("🗃️ Order {} has no token, but the token update did not apply. This is a bug.", order.ticket_id);
                Err(PaymentGatewayError::DatabaseError(format!(
                    "Could not assign a token to order {}",
                    order.ticket_id
                )))
            },
        }
    }

    async fn transition_order(
        &self,
        order_id: i64,
        from: &[OrderStatusType],
        to: OrderStatusType,
        fulfillment: Option<NewFulfillment>,
    ) -> Result<TransitionResult, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        // The compare-and-set must be the first statement in the transaction. SQLite then serializes concurrent
        // writers on the write lock, and each of them evaluates the guard against the latest committed status.
        let updated = orders::compare_and_set_status(order_id, from, to, &mut tx).await?;
        let result = match updated {
            Some(order) => {
                let fulfillment = match fulfillment {
                    Some(f) => Some(fulfillments::insert_fulfillment(f, &mut tx).await?),
                    None => None,
                };
                tx.commit().await?;
                TransitionResult::Applied { order, fulfillment }
            },
            None => {
                let order = orders::fetch_order_by_id(order_id, &mut tx)
                    .await?
                    .ok_or(PaymentGatewayError::OrderIdNotFound(order_id))?;
                tx.commit().await?;
                TransitionResult::Unchanged(order)
            },
        };
        Ok(result)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
