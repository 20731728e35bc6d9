// server/src/services/orders.rs

//! Order Aggregate Manager: the only legitimate creator of order rows, plus
//! read access to the aggregate. Settlement transitions live in
//! `services::settlement`, which this module's write path defers to.

use crate::db;
use crate::errors::{AppError, Result};
use crate::models::{Order, OrderItem, PaymentDetails};
use crate::services::cart::{order_total, PricedLine};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

/// An order with its items and (after settlement) its payment record.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
  pub order: Order,
  pub items: Vec<OrderItem>,
  pub payment: Option<PaymentDetails>,
}

/// Creates a pending order from already-priced lines. The total is computed
/// here from the same lines that become the immutable items; client input
/// never carries prices.
#[instrument(name = "orders::create_order", skip(pool, lines), fields(user_id = %user_id, lines = lines.len()))]
pub async fn create_order(pool: &PgPool, user_id: Uuid, currency: &str, lines: &[PricedLine]) -> Result<OrderDetail> {
  if lines.is_empty() {
    return Err(AppError::Validation(
      "Order must contain at least one purchasable course.".to_string(),
    ));
  }

  let total_cents = order_total(lines);
  let (order, items) = db::orders::insert_order(pool, user_id, currency, total_cents, lines).await?;

  info!(
    "Order {} created for user {}: {} item(s), total {} {}.",
    order.id,
    user_id,
    items.len(),
    order.total_cents,
    order.currency
  );

  Ok(OrderDetail {
    order,
    items,
    payment: None,
  })
}

/// Loads the full aggregate, or `NotFound`.
pub async fn get_order(pool: &PgPool, order_id: Uuid) -> Result<OrderDetail> {
  let order = db::orders::fetch_order(pool, order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order with ID {} not found.", order_id)))?;
  let items = db::orders::fetch_order_items(pool, order_id).await?;
  let payment = db::orders::fetch_payment_details(pool, order_id).await?;
  Ok(OrderDetail { order, items, payment })
}

/// Loads the aggregate and enforces owner visibility.
pub async fn get_order_for_user(pool: &PgPool, user_id: Uuid, order_id: Uuid) -> Result<OrderDetail> {
  let detail = get_order(pool, order_id).await?;
  if detail.order.user_id != user_id {
    return Err(AppError::Auth("Order belongs to a different user.".to_string()));
  }
  Ok(detail)
}
