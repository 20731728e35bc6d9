// server/src/services/settlement.rs

//! Settlement Coordinator: reconciles a normalized provider confirmation
//! with an order and grants entitlements.
//!
//! Two failure domains, deliberately separated:
//! - the financial transition (status change + payment record) is one
//!   transaction and either fully applies or leaves the order untouched;
//! - the enrollment grant runs after that transaction commits and its
//!   failure is logged, never propagated — a committed payment is the
//!   authoritative financial event, and the grant is idempotent so a
//!   re-delivered confirmation heals it.

use crate::db;
use crate::errors::{AppError, Result};
use crate::models::{Order, PaymentMethod, PaymentStatus};
use crate::services::payments::{NormalizedPaymentResult, ProviderStatus};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// The pure settlement decision: what status the order moves to and whether
/// entitlements follow. No I/O happens here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementPlan {
  pub new_status: PaymentStatus,
  pub grant_enrollment: bool,
  /// True when the confirmation re-applies the status the order already
  /// carries (a re-delivered settlement).
  pub replay: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementOutcome {
  pub order_id: Uuid,
  pub payment_status: PaymentStatus,
  pub courses_granted: u64,
}

/// Decides how `result` settles `order`.
///
/// A mismatched amount or currency is a `Conflict` and must never be
/// accepted. `Succeeded` maps to `paid`; every other provider status maps to
/// `failed` (the order level does not currently distinguish
/// requires-action/canceled from declined). An illegal status transition —
/// e.g. a success confirmation for an order already settled `failed` — is a
/// `Conflict` rather than a silent rewrite of financial history.
pub fn plan_settlement(order: &Order, result: &NormalizedPaymentResult) -> Result<SettlementPlan> {
  if result.amount_cents != order.total_cents {
    return Err(AppError::Conflict(format!(
      "Settlement amount {} does not match order total {} for order {}.",
      result.amount_cents, order.total_cents, order.id
    )));
  }
  if !result.currency.eq_ignore_ascii_case(&order.currency) {
    return Err(AppError::Conflict(format!(
      "Settlement currency {} does not match order currency {} for order {}.",
      result.currency, order.currency, order.id
    )));
  }

  let new_status = match result.status {
    ProviderStatus::Succeeded => PaymentStatus::Paid,
    _ => PaymentStatus::Failed,
  };

  if !order.payment_status.can_transition_to(new_status) {
    return Err(AppError::Conflict(format!(
      "Order {} is {:?} and cannot transition to {:?}.",
      order.id, order.payment_status, new_status
    )));
  }

  Ok(SettlementPlan {
    new_status,
    grant_enrollment: new_status == PaymentStatus::Paid,
    replay: order.payment_status == new_status,
  })
}

/// Settles `order_id` with a provider confirmation. Idempotent per order:
/// re-delivery of the same confirmation converges on the same end state with
/// exactly one payment record and one enrollment row per course.
#[instrument(name = "settlement::settle", skip(pool, result), fields(order_id = %order_id, provider = %method))]
pub async fn settle(
  pool: &PgPool,
  order_id: Uuid,
  method: PaymentMethod,
  result: &NormalizedPaymentResult,
) -> Result<SettlementOutcome> {
  // No phantom payment records: the order must exist before anything is
  // written.
  let order = db::orders::fetch_order(pool, order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order with ID {} not found.", order_id)))?;

  let plan = plan_settlement(&order, result)?;
  if plan.replay {
    info!("Order {} re-settled with status {:?}; replay.", order.id, plan.new_status);
  }

  db::orders::apply_settlement(pool, &order, method, plan.new_status, result).await?;
  info!(
    "Order {} settled: {:?} -> {:?} (intent {}).",
    order.id, order.payment_status, plan.new_status, result.intent_id
  );

  let mut courses_granted = 0;
  if plan.grant_enrollment {
    match grant_order_courses(pool, &order).await {
      Ok(granted) => courses_granted = granted,
      Err(e) => {
        // The payment stands. Re-running settlement (skip-duplicates)
        // finishes the grant.
        error!(
          "Enrollment grant failed for paid order {}: {:?}. Will heal on idempotent re-settlement.",
          order.id, e
        );
      }
    }
  }

  Ok(SettlementOutcome {
    order_id: order.id,
    payment_status: plan.new_status,
    courses_granted,
  })
}

/// Grants ownership of every course in the order, skipping duplicates.
async fn grant_order_courses(pool: &PgPool, order: &Order) -> Result<u64> {
  let items = db::orders::fetch_order_items(pool, order.id).await?;
  if items.is_empty() {
    warn!("Paid order {} has no items; nothing to grant.", order.id);
    return Ok(0);
  }
  let course_ids: Vec<Uuid> = items.iter().map(|i| i.course_id).collect();
  let granted = db::enrollments::grant_courses(pool, order.user_id, &course_ids).await?;
  info!(
    "Granted {} of {} course(s) from order {} to user {} (the rest were already owned).",
    granted,
    course_ids.len(),
    order.id,
    order.user_id
  );
  Ok(granted)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn order_with(status: PaymentStatus, total_cents: i64) -> Order {
    Order {
      id: Uuid::new_v4(),
      user_id: Uuid::new_v4(),
      payment_status: status,
      payment_method: None,
      total_cents,
      currency: "USD".to_string(),
      provider_intent_id: None,
      provider_client_data: None,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  fn result_with(status: ProviderStatus, amount_cents: i64, currency: &str) -> NormalizedPaymentResult {
    NormalizedPaymentResult {
      intent_id: "pi_test".to_string(),
      amount_cents,
      currency: currency.to_string(),
      status,
    }
  }

  #[test]
  fn success_settles_a_pending_order_paid_and_grants() {
    let order = order_with(PaymentStatus::Pending, 6998);
    let plan = plan_settlement(&order, &result_with(ProviderStatus::Succeeded, 6998, "USD")).unwrap();
    assert_eq!(plan.new_status, PaymentStatus::Paid);
    assert!(plan.grant_enrollment);
    assert!(!plan.replay);
  }

  #[test]
  fn every_non_success_status_settles_failed_without_granting() {
    for status in [ProviderStatus::RequiresAction, ProviderStatus::Failed, ProviderStatus::Canceled] {
      let order = order_with(PaymentStatus::Pending, 6998);
      let plan = plan_settlement(&order, &result_with(status, 6998, "USD")).unwrap();
      assert_eq!(plan.new_status, PaymentStatus::Failed, "{status:?}");
      assert!(!plan.grant_enrollment, "{status:?}");
    }
  }

  #[test]
  fn amount_mismatch_is_a_conflict() {
    let order = order_with(PaymentStatus::Pending, 6998);
    let err = plan_settlement(&order, &result_with(ProviderStatus::Succeeded, 9999, "USD")).unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
  }

  #[test]
  fn currency_mismatch_is_a_conflict() {
    let order = order_with(PaymentStatus::Pending, 6998);
    let err = plan_settlement(&order, &result_with(ProviderStatus::Succeeded, 6998, "EUR")).unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
  }

  #[test]
  fn currency_comparison_ignores_case() {
    let order = order_with(PaymentStatus::Pending, 6998);
    // Card networks report lowercase currency codes.
    assert!(plan_settlement(&order, &result_with(ProviderStatus::Succeeded, 6998, "usd")).is_ok());
  }

  #[test]
  fn redelivered_success_is_an_idempotent_replay() {
    let order = order_with(PaymentStatus::Paid, 6998);
    let plan = plan_settlement(&order, &result_with(ProviderStatus::Succeeded, 6998, "USD")).unwrap();
    assert_eq!(plan.new_status, PaymentStatus::Paid);
    assert!(plan.replay);
    // The grant re-runs with skip-duplicates semantics.
    assert!(plan.grant_enrollment);
  }

  #[test]
  fn success_for_an_order_already_failed_is_a_conflict() {
    let order = order_with(PaymentStatus::Failed, 6998);
    let err = plan_settlement(&order, &result_with(ProviderStatus::Succeeded, 6998, "USD")).unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
  }

  #[test]
  fn failure_for_an_order_already_paid_is_a_conflict() {
    let order = order_with(PaymentStatus::Paid, 6998);
    let err = plan_settlement(&order, &result_with(ProviderStatus::Failed, 6998, "USD")).unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
  }
}
