// server/src/services/payments/stripe.rs

//! Card-network adapter (Stripe-style protocol): charge intents with a
//! client secret handed to the frontend, lowercase currency codes, and the
//! `payment_intent.*` webhook family. The gateway exchange itself is
//! simulated in-process; the protocol mapping is real and everything
//! Stripe-flavored stays inside this module.

use crate::errors::{AppError, Result};
use crate::services::payments::{ChargeIntent, NormalizedPaymentResult, ProviderEvent, ProviderStatus};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StripeAdapter {
  merchant_account: String,
}

impl StripeAdapter {
  pub fn new(merchant_account: &str) -> Result<Self> {
    if merchant_account.is_empty() {
      return Err(AppError::Config(
        "Stripe merchant account is not configured.".to_string(),
      ));
    }
    Ok(Self {
      merchant_account: merchant_account.to_string(),
    })
  }

  #[instrument(name = "stripe::create_charge_intent", skip(self), fields(merchant = %self.merchant_account))]
  pub async fn create_charge_intent(&self, order_id: Uuid, amount_cents: i64, currency: &str) -> Result<ChargeIntent> {
    if amount_cents <= 0 {
      return Err(AppError::Validation("Charge amount must be greater than zero.".to_string()));
    }
    // Simulated gateway round-trip
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let intent_id = format!("pi_{}", Uuid::new_v4().simple());
    info!(
      "Card intent {} created for order {} ({} {}).",
      intent_id, order_id, amount_cents, currency
    );
    Ok(ChargeIntent {
      client_secret: Some(format!("{}_secret_{}", intent_id, Uuid::new_v4().simple())),
      redirect_url: None,
      intent_id,
    })
  }

  #[instrument(name = "stripe::confirm_charge", skip(self))]
  pub async fn confirm_charge(&self, intent_id: &str, amount_cents: i64, currency: &str) -> Result<NormalizedPaymentResult> {
    if !intent_id.starts_with("pi_") {
      return Err(AppError::Provider(format!(
        "Card network does not recognize payment intent '{}'.",
        intent_id
      )));
    }
    // Simulated gateway round-trip; the sandbox declines a marker amount.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let raw_status = if amount_cents % 1000 == 123 {
      "requires_payment_method"
    } else {
      "succeeded"
    };

    let status = normalize_status(raw_status)?;
    info!("Card intent {} confirmed with status {:?}.", intent_id, status);
    Ok(NormalizedPaymentResult {
      intent_id: intent_id.to_string(),
      amount_cents,
      currency: currency.to_string(),
      status,
    })
  }

  /// Decodes a `payment_intent.*` webhook into the order it settles and a
  /// normalized result. The order id travels in the intent's metadata.
  pub fn parse_webhook(&self, payload: &[u8]) -> Result<ProviderEvent> {
    let event: StripeEvent = serde_json::from_slice(payload)
      .map_err(|e| AppError::Validation(format!("Invalid card-network webhook payload: {}", e)))?;

    if !event.event_type.starts_with("payment_intent.") {
      return Err(AppError::Validation(format!(
        "Unhandled card-network event type '{}'.",
        event.event_type
      )));
    }

    let object = event.data.object;
    let status = normalize_status(&object.status)?;
    Ok(ProviderEvent {
      order_id: object.metadata.order_id,
      result: NormalizedPaymentResult {
        intent_id: object.id,
        amount_cents: object.amount,
        currency: object.currency,
        status,
      },
    })
  }
}

/// Maps the card network's state vocabulary onto the shared one. Unknown
/// states are protocol errors, never silently coerced.
pub fn normalize_status(raw: &str) -> Result<ProviderStatus> {
  match raw {
    "succeeded" => Ok(ProviderStatus::Succeeded),
    "requires_action" | "requires_confirmation" | "processing" => Ok(ProviderStatus::RequiresAction),
    "requires_payment_method" => Ok(ProviderStatus::Failed),
    "canceled" => Ok(ProviderStatus::Canceled),
    other => Err(AppError::Provider(format!(
      "Unrecognized card-network status '{}'.",
      other
    ))),
  }
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
  #[serde(rename = "type")]
  event_type: String,
  data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
  object: StripeIntentObject,
}

#[derive(Debug, Deserialize)]
struct StripeIntentObject {
  id: String,
  amount: i64,
  currency: String,
  status: String,
  metadata: StripeIntentMetadata,
}

#[derive(Debug, Deserialize)]
struct StripeIntentMetadata {
  order_id: Uuid,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn adapter() -> StripeAdapter {
    StripeAdapter::new("acct_test").unwrap()
  }

  #[test]
  fn empty_merchant_account_is_a_config_error() {
    assert!(matches!(StripeAdapter::new(""), Err(AppError::Config(_))));
  }

  #[test]
  fn vocabulary_normalizes_onto_the_shared_statuses() {
    assert_eq!(normalize_status("succeeded").unwrap(), ProviderStatus::Succeeded);
    assert_eq!(normalize_status("requires_action").unwrap(), ProviderStatus::RequiresAction);
    assert_eq!(normalize_status("processing").unwrap(), ProviderStatus::RequiresAction);
    assert_eq!(normalize_status("requires_payment_method").unwrap(), ProviderStatus::Failed);
    assert_eq!(normalize_status("canceled").unwrap(), ProviderStatus::Canceled);
    assert!(matches!(normalize_status("on_fire"), Err(AppError::Provider(_))));
  }

  #[tokio::test]
  async fn created_intent_carries_a_client_secret_not_a_redirect() {
    let intent = adapter()
      .create_charge_intent(Uuid::new_v4(), 6998, "USD")
      .await
      .unwrap();
    assert!(intent.intent_id.starts_with("pi_"));
    assert!(intent.client_secret.is_some());
    assert!(intent.redirect_url.is_none());
  }

  #[tokio::test]
  async fn zero_amount_intents_are_rejected() {
    let err = adapter().create_charge_intent(Uuid::new_v4(), 0, "USD").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
  }

  #[tokio::test]
  async fn confirm_echoes_amount_and_currency() {
    let result = adapter().confirm_charge("pi_abc", 6998, "USD").await.unwrap();
    assert_eq!(result.status, ProviderStatus::Succeeded);
    assert_eq!(result.amount_cents, 6998);
    assert_eq!(result.currency, "USD");
    assert_eq!(result.intent_id, "pi_abc");
  }

  #[tokio::test]
  async fn sandbox_marker_amount_is_declined() {
    let result = adapter().confirm_charge("pi_abc", 5123, "USD").await.unwrap();
    assert_eq!(result.status, ProviderStatus::Failed);
  }

  #[tokio::test]
  async fn foreign_intent_ids_are_protocol_errors() {
    let err = adapter().confirm_charge("PAY-123", 6998, "USD").await.unwrap_err();
    assert!(matches!(err, AppError::Provider(_)));
  }

  #[test]
  fn webhook_decodes_into_order_id_and_normalized_result() {
    let order_id = Uuid::new_v4();
    let payload = json!({
      "type": "payment_intent.succeeded",
      "data": { "object": {
        "id": "pi_123",
        "amount": 6998,
        "currency": "usd",
        "status": "succeeded",
        "metadata": { "order_id": order_id }
      }}
    });
    let event = adapter().parse_webhook(payload.to_string().as_bytes()).unwrap();
    assert_eq!(event.order_id, order_id);
    assert_eq!(event.result.status, ProviderStatus::Succeeded);
    assert_eq!(event.result.amount_cents, 6998);
    assert_eq!(event.result.intent_id, "pi_123");
  }

  #[test]
  fn non_payment_intent_events_are_rejected() {
    let payload = json!({
      "type": "customer.created",
      "data": { "object": {
        "id": "pi_123", "amount": 1, "currency": "usd", "status": "succeeded",
        "metadata": { "order_id": Uuid::new_v4() }
      }}
    });
    let err = adapter().parse_webhook(payload.to_string().as_bytes()).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
  }

  #[test]
  fn malformed_webhook_payloads_are_rejected() {
    let err = adapter().parse_webhook(b"not json").unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
  }
}
