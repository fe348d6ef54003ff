use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{NewLineItem, Order, SalesLedgerEntry};

/// Writes one ledger row per line item of a freshly inserted order, stamped with the order's creation time.
pub async fn record_sale(order: &Order, items: &[NewLineItem], conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    if items.is_empty() {
        return Ok(());
    }
    let mut builder = QueryBuilder::new(
        "INSERT INTO sales_ledger (order_id, ticket_id, product_ref, name, quantity, unit_price, subtotal, sold_at) ",
    );
    builder.push_values(items, |mut row, item| {
        row.push_bind(order.id)
            .push_bind(&order.ticket_id)
            .push_bind(&item.product_ref)
            .push_bind(&item.name)
            .push_bind(item.quantity)
            .push_bind(item.unit_price)
            .push_bind(item.subtotal)
            .push_bind(order.created_at);
    });
    builder.build().execute(conn).await?;
    Ok(())
}

pub async fn fetch_entries(
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    conn: &mut SqliteConnection,
) -> Result<Vec<SalesLedgerEntry>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM sales_ledger WHERE 1 = 1");
    if let Some(since) = since {
        builder.push(" AND sold_at >= ");
        builder.push_bind(since);
    }
    if let Some(until) = until {
        builder.push(" AND sold_at <= ");
        builder.push_bind(until);
    }
    builder.push(" ORDER BY sold_at ASC, id ASC");
    builder.build_query_as().fetch_all(conn).await
}
