use chrono::Utc;
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{GatewayToken, LineItem, NewLineItem, NewOrder, Order, OrderStatusType, TicketId},
    order_objects::OrderQueryFilter,
    traits::PaymentGatewayError,
};

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Inserts a new order into the database using the given connection. This is not atomic. Embed this call inside a
/// transaction, along with [`insert_line_items`], and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, PaymentGatewayError> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                ticket_id,
                customer_id,
                email,
                name,
                tax_id,
                phone,
                total,
                street,
                number,
                locality,
                region,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            RETURNING *;
        "#,
    )
    .bind(&order.ticket_id)
    .bind(order.customer_id)
    .bind(&order.contact.email)
    .bind(&order.contact.name)
    .bind(&order.contact.tax_id)
    .bind(&order.contact.phone)
    .bind(order.total)
    .bind(&order.shipping_address.street)
    .bind(&order.shipping_address.number)
    .bind(&order.shipping_address.locality)
    .bind(&order.shipping_address.region)
    .bind(OrderStatusType::Pending)
    .bind(order.created_at)
    .fetch_one(conn)
    .await;
    match result {
        Ok(order) => Ok(order),
        Err(e) if is_unique_violation(&e) => Err(PaymentGatewayError::TicketIdCollision(order.ticket_id.clone())),
        Err(e) => Err(e.into()),
    }
}

pub async fn insert_line_items(
    order_id: i64,
    items: &[NewLineItem],
    conn: &mut SqliteConnection,
) -> Result<(), PaymentGatewayError> {
    if items.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::new("INSERT INTO order_items (order_id, product_ref, name, quantity, unit_price, subtotal) ");
    builder.push_values(items, |mut row, item| {
        row.push_bind(order_id)
            .push_bind(&item.product_ref)
            .push_bind(&item.name)
            .push_bind(item.quantity)
            .push_bind(item.unit_price)
            .push_bind(item.subtotal);
    });
    let result = builder.build().execute(conn).await?;
    trace!("🗃️ {} line items saved for order #{order_id}", result.rows_affected());
    Ok(())
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_ticket_id(
    ticket_id: &TicketId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE ticket_id = $1").bind(ticket_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_token(
    token: &GatewayToken,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE gateway_token = $1").bind(token).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_line_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<LineItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Sets the gateway token, but only if the order does not have one yet. Returns `None` if no row was updated, either
/// because the order does not exist or because it already carries a token.
pub async fn set_token_if_unset(
    order_id: i64,
    token: &GatewayToken,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, PaymentGatewayError> {
    let result = sqlx::query_as(
        r#"
            UPDATE orders SET gateway_token = $1, updated_at = $2
            WHERE id = $3 AND gateway_token IS NULL
            RETURNING *;
        "#,
    )
    .bind(token)
    .bind(Utc::now())
    .bind(order_id)
    .fetch_optional(conn)
    .await;
    match result {
        Ok(order) => Ok(order),
        Err(e) if is_unique_violation(&e) => Err(PaymentGatewayError::TokenAlreadyInUse(token.clone())),
        Err(e) => Err(e.into()),
    }
}

/// Compare-and-set on the status column. The row is only updated if its current status is one of `from`.
///
/// Returns the updated order, or `None` if the order's status did not match (or the order does not exist).
pub async fn compare_and_set_status(
    order_id: i64,
    from: &[OrderStatusType],
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    if from.is_empty() {
        return Ok(None);
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET status = ");
    builder.push_bind(to);
    builder.push(", updated_at = ");
    builder.push_bind(Utc::now());
    builder.push(" WHERE id = ");
    builder.push_bind(order_id);
    builder.push(" AND status IN (");
    let mut statuses = builder.separated(", ");
    for status in from {
        statuses.push_bind(*status);
    }
    statuses.push_unseparated(") RETURNING *");
    let order: Option<Order> = builder.build_query_as().fetch_optional(conn).await?;
    match &order {
        Some(o) => debug!("🗃️ Order {} moved to {to}", o.ticket_id),
        None => trace!("🗃️ Order #{order_id} was not in any of {from:?}. Status left alone"),
    }
    Ok(order)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(ticket_id) = query.ticket_id {
        where_clause.push("ticket_id = ");
        where_clause.push_bind_unseparated(ticket_id);
    }
    if let Some(cid) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(cid);
    }
    if let Some(email) = query.email {
        where_clause.push("email = ");
        where_clause.push_bind_unseparated(email);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        for (i, status) in statuses.into_iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status);
        }
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC, id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {:?}", orders.len());
    Ok(orders)
}
