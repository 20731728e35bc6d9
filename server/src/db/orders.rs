// server/src/db/orders.rs

//! Order aggregate persistence. The order row, its immutable items and its
//! one-to-one payment record are written here and nowhere else.

use crate::errors::Result;
use crate::models::{Order, OrderItem, PaymentDetails, PaymentMethod, PaymentStatus};
use crate::services::cart::PricedLine;
use crate::services::payments::NormalizedPaymentResult;
use sqlx::PgPool;
use uuid::Uuid;

/// Inserts an order (status `pending`) together with its items in one
/// transaction. The total is computed by the caller from the same priced
/// lines that become the items.
pub async fn insert_order(
  pool: &PgPool,
  user_id: Uuid,
  currency: &str,
  total_cents: i64,
  lines: &[PricedLine],
) -> Result<(Order, Vec<OrderItem>)> {
  let mut tx = pool.begin().await?;

  let order = sqlx::query_as::<_, Order>(
    "INSERT INTO orders (id, user_id, payment_status, total_cents, currency, created_at, updated_at) \
     VALUES ($1, $2, 'pending', $3, $4, now(), now()) \
     RETURNING id, user_id, payment_status, payment_method, total_cents, currency, \
               provider_intent_id, provider_client_data, created_at, updated_at",
  )
  .bind(Uuid::new_v4())
  .bind(user_id)
  .bind(total_cents)
  .bind(currency)
  .fetch_one(&mut *tx)
  .await?;

  let mut items = Vec::with_capacity(lines.len());
  for line in lines {
    let item = sqlx::query_as::<_, OrderItem>(
      "INSERT INTO order_items (id, order_id, course_id, course_title, course_thumbnail, price_cents) \
       VALUES ($1, $2, $3, $4, $5, $6) \
       RETURNING id, order_id, course_id, course_title, course_thumbnail, price_cents",
    )
    .bind(Uuid::new_v4())
    .bind(order.id)
    .bind(line.course_id)
    .bind(&line.course_title)
    .bind(&line.course_thumbnail)
    .bind(line.price_cents)
    .fetch_one(&mut *tx)
    .await?;
    items.push(item);
  }

  tx.commit().await?;
  Ok((order, items))
}

pub async fn fetch_order(pool: &PgPool, order_id: Uuid) -> Result<Option<Order>> {
  let order = sqlx::query_as::<_, Order>(
    "SELECT id, user_id, payment_status, payment_method, total_cents, currency, \
            provider_intent_id, provider_client_data, created_at, updated_at \
     FROM orders WHERE id = $1",
  )
  .bind(order_id)
  .fetch_optional(pool)
  .await?;
  Ok(order)
}

pub async fn fetch_order_items(pool: &PgPool, order_id: Uuid) -> Result<Vec<OrderItem>> {
  let items = sqlx::query_as::<_, OrderItem>(
    "SELECT id, order_id, course_id, course_title, course_thumbnail, price_cents \
     FROM order_items WHERE order_id = $1 ORDER BY course_title ASC",
  )
  .bind(order_id)
  .fetch_all(pool)
  .await?;
  Ok(items)
}

pub async fn fetch_payment_details(pool: &PgPool, order_id: Uuid) -> Result<Option<PaymentDetails>> {
  let details = sqlx::query_as::<_, PaymentDetails>(
    "SELECT id, order_id, payment_intent_id, payment_method, amount_cents, currency, status, \
            user_id, created_at, updated_at \
     FROM payment_details WHERE order_id = $1",
  )
  .bind(order_id)
  .fetch_optional(pool)
  .await?;
  Ok(details)
}

/// Records the provider charge-intent reference on the order at payment
/// initiation time.
pub async fn record_charge_intent(
  pool: &PgPool,
  order_id: Uuid,
  method: PaymentMethod,
  intent_id: &str,
  client_data: Option<&str>,
) -> Result<Order> {
  let order = sqlx::query_as::<_, Order>(
    "UPDATE orders \
     SET payment_method = $1, provider_intent_id = $2, provider_client_data = $3, updated_at = now() \
     WHERE id = $4 \
     RETURNING id, user_id, payment_status, payment_method, total_cents, currency, \
               provider_intent_id, provider_client_data, created_at, updated_at",
  )
  .bind(method)
  .bind(intent_id)
  .bind(client_data)
  .bind(order_id)
  .fetch_one(pool)
  .await?;
  Ok(order)
}

/// The settlement transition primitive: one transaction that moves the order
/// to its new payment status and upserts the payment record keyed by
/// order_id. A failure anywhere leaves the order untouched.
pub async fn apply_settlement(
  pool: &PgPool,
  order: &Order,
  method: PaymentMethod,
  new_status: PaymentStatus,
  result: &NormalizedPaymentResult,
) -> Result<()> {
  let mut tx = pool.begin().await?;

  sqlx::query("UPDATE orders SET payment_status = $1, payment_method = $2, updated_at = now() WHERE id = $3")
    .bind(new_status)
    .bind(method)
    .bind(order.id)
    .execute(&mut *tx)
    .await?;

  // Keyed by order_id, not intent_id: a second confirmation for the same
  // order overwrites rather than duplicates.
  sqlx::query(
    "INSERT INTO payment_details \
       (id, order_id, payment_intent_id, payment_method, amount_cents, currency, status, user_id, created_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now(), now()) \
     ON CONFLICT (order_id) DO UPDATE \
     SET payment_intent_id = EXCLUDED.payment_intent_id, \
         payment_method = EXCLUDED.payment_method, \
         amount_cents = EXCLUDED.amount_cents, \
         currency = EXCLUDED.currency, \
         status = EXCLUDED.status, \
         updated_at = now()",
  )
  .bind(Uuid::new_v4())
  .bind(order.id)
  .bind(&result.intent_id)
  .bind(method)
  .bind(result.amount_cents)
  .bind(&result.currency)
  .bind(result.status.as_str())
  .bind(order.user_id)
  .execute(&mut *tx)
  .await?;

  tx.commit().await?;
  Ok(())
}
