// server/src/models/order_item.rs

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One course line within an order. Immutable once created: the price and the
/// display fields are snapshots taken at purchase time and do not follow
/// later course edits.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub course_id: Uuid,
  pub course_title: String,
  pub course_thumbnail: Option<String>,
  pub price_cents: i64,
  // created_at/updated_at not needed for immutable line items
}
