// server/src/models/payment_details.rs

use crate::models::order::PaymentMethod;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Provider-side record of an order's settlement, one-to-one with the order.
///
/// `order_id` carries a unique constraint: the order is the idempotency
/// boundary, so a re-delivered confirmation overwrites this row instead of
/// creating a second one. Written only by the settlement path.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PaymentDetails {
  pub id: Uuid,
  pub order_id: Uuid,
  pub payment_intent_id: String,
  pub payment_method: PaymentMethod,
  pub amount_cents: i64,
  pub currency: String,
  /// Provider-normalized status string as last reported.
  pub status: String,
  pub user_id: Uuid,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
