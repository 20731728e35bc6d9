// server/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid; // Renamed Type to SqlxType to avoid conflict

/// Order payment status. Matches `payment_status_enum` in schema.sql.
///
/// Lifecycle: `Pending` settles into exactly one of `Paid`/`Failed`/
/// `Declined`/`Cancelled`; a `Paid` order may later be revised by provider
/// events into `Refunded`/`PartiallyRefunded`/`Chargeback`. There is no path
/// back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_status_enum", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
  Pending,
  Paid,
  Failed,
  Declined,
  Cancelled,
  Refunded,
  PartiallyRefunded,
  Chargeback,
}

impl PaymentStatus {
  /// Whether the status machine admits `self -> next`.
  ///
  /// Re-applying the current status is always admitted so that re-delivered
  /// settlements are a no-op rather than an error.
  pub fn can_transition_to(self, next: PaymentStatus) -> bool {
    if self == next {
      return true;
    }
    match self {
      PaymentStatus::Pending => matches!(
        next,
        PaymentStatus::Paid | PaymentStatus::Failed | PaymentStatus::Declined | PaymentStatus::Cancelled
      ),
      PaymentStatus::Paid => matches!(
        next,
        PaymentStatus::Refunded | PaymentStatus::PartiallyRefunded | PaymentStatus::Chargeback
      ),
      _ => false,
    }
  }
}

/// Payment processor behind an order. Matches `payment_method_enum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[sqlx(type_name = "payment_method_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
  Stripe,
  Paypal,
}

impl PaymentMethod {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentMethod::Stripe => "stripe",
      PaymentMethod::Paypal => "paypal",
    }
  }
}

impl std::fmt::Display for PaymentMethod {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for PaymentMethod {
  type Err = ();

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s {
      "stripe" => Ok(PaymentMethod::Stripe),
      "paypal" => Ok(PaymentMethod::Paypal),
      _ => Err(()),
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub payment_status: PaymentStatus,
  pub payment_method: Option<PaymentMethod>,
  /// Sum of the item price snapshots at creation time; immutable thereafter.
  pub total_cents: i64,
  pub currency: String,
  // Charge-intent reference recorded at payment initiation
  pub provider_intent_id: Option<String>,
  pub provider_client_data: Option<String>, // client_secret or approval redirect URL
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::PaymentStatus::*;

  #[test]
  fn pending_settles_into_exactly_the_terminal_statuses() {
    for next in [Paid, Failed, Declined, Cancelled] {
      assert!(Pending.can_transition_to(next), "pending -> {next:?}");
    }
    for next in [Refunded, PartiallyRefunded, Chargeback] {
      assert!(!Pending.can_transition_to(next), "pending -> {next:?} must be rejected");
    }
  }

  #[test]
  fn paid_admits_only_post_settlement_revisions() {
    for next in [Refunded, PartiallyRefunded, Chargeback] {
      assert!(Paid.can_transition_to(next), "paid -> {next:?}");
    }
    for next in [Pending, Failed, Declined, Cancelled] {
      assert!(!Paid.can_transition_to(next), "paid -> {next:?} must be rejected");
    }
  }

  #[test]
  fn reapplying_the_same_status_is_admitted() {
    for status in [Pending, Paid, Failed, Declined, Cancelled, Refunded, PartiallyRefunded, Chargeback] {
      assert!(status.can_transition_to(status));
    }
  }

  #[test]
  fn failed_orders_never_become_paid() {
    assert!(!Failed.can_transition_to(Paid));
    assert!(!Declined.can_transition_to(Paid));
    assert!(!Cancelled.can_transition_to(Paid));
  }
}
