use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Fulfillment, FulfillmentStatus, Handler, NewFulfillment},
    traits::{Pagination, PaymentGatewayError},
};

/// Inserts a fulfillment record in the `Pending` state. The schema allows one record per order; a second insert for
/// the same order fails with [`PaymentGatewayError::DuplicateFulfillment`].
pub async fn insert_fulfillment(
    fulfillment: NewFulfillment,
    conn: &mut SqliteConnection,
) -> Result<Fulfillment, PaymentGatewayError> {
    let order_id = fulfillment.order_id;
    let result = sqlx::query_as(
        r#"
            INSERT INTO fulfillments (
                order_id, ticket_id, contact_name, contact_email,
                street, number, locality, region, contact_phone, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(fulfillment.ticket_id)
    .bind(fulfillment.contact_name)
    .bind(fulfillment.contact_email)
    .bind(fulfillment.address.street)
    .bind(fulfillment.address.number)
    .bind(fulfillment.address.locality)
    .bind(fulfillment.address.region)
    .bind(fulfillment.contact_phone)
    .bind(FulfillmentStatus::Pending)
    .bind(Utc::now())
    .fetch_one(conn)
    .await;
    match result {
        Ok(f) => {
            debug!("🗃️ Fulfillment record created for order #{order_id}");
            Ok(f)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(PaymentGatewayError::DuplicateFulfillment(order_id))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_fulfillment(id: i64, conn: &mut SqliteConnection) -> Result<Option<Fulfillment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM fulfillments WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_fulfillment_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Fulfillment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM fulfillments WHERE order_id = $1").bind(order_id).fetch_optional(conn).await
}

pub async fn fetch_fulfillments(page: Pagination, conn: &mut SqliteConnection) -> Result<Vec<Fulfillment>, sqlx::Error> {
    let page = page.normalized();
    sqlx::query_as("SELECT * FROM fulfillments ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2")
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(conn)
        .await
}

pub async fn count_fulfillments(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM fulfillments").fetch_one(conn).await?;
    Ok(count)
}

pub async fn fetch_fulfillments_for_handler(
    handler_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Fulfillment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM fulfillments WHERE handler_id = $1 ORDER BY dispatched_at DESC, id DESC")
        .bind(handler_id)
        .fetch_all(conn)
        .await
}

/// Compare-and-set from `Pending` to `Assigned`. Returns `None` if the record is missing or no longer pending.
pub async fn claim(
    id: i64,
    handler: &Handler,
    conn: &mut SqliteConnection,
) -> Result<Option<Fulfillment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE fulfillments SET status = $1, handler_id = $2, handler_email = $3, dispatched_at = $4
            WHERE id = $5 AND status = $6
            RETURNING *;
        "#,
    )
    .bind(FulfillmentStatus::Assigned)
    .bind(handler.id)
    .bind(&handler.email)
    .bind(Utc::now())
    .bind(id)
    .bind(FulfillmentStatus::Pending)
    .fetch_optional(conn)
    .await
}

/// Compare-and-set from `Assigned` (to `handler_id`) to `Delivered`. Returns `None` if the guard did not match.
pub async fn complete(id: i64, handler_id: i64, conn: &mut SqliteConnection) -> Result<Option<Fulfillment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE fulfillments SET status = $1, completed_at = $2
            WHERE id = $3 AND status = $4 AND handler_id = $5
            RETURNING *;
        "#,
    )
    .bind(FulfillmentStatus::Delivered)
    .bind(Utc::now())
    .bind(id)
    .bind(FulfillmentStatus::Assigned)
    .bind(handler_id)
    .fetch_optional(conn)
    .await
}
