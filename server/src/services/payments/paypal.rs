// server/src/services/payments/paypal.rs

//! Wallet-redirect adapter (PayPal-style protocol): the buyer approves the
//! charge on the wallet's site via a redirect URL, amounts travel as decimal
//! strings with uppercase currency codes, and webhooks carry the order
//! reference in `resource.custom_id`. The gateway exchange is simulated
//! in-process; the protocol mapping is real.

use crate::errors::{AppError, Result};
use crate::services::payments::{ChargeIntent, NormalizedPaymentResult, ProviderEvent, ProviderStatus};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PayPalAdapter {
  merchant_account: String,
}

impl PayPalAdapter {
  pub fn new(merchant_account: &str) -> Result<Self> {
    if merchant_account.is_empty() {
      return Err(AppError::Config(
        "PayPal merchant account is not configured.".to_string(),
      ));
    }
    Ok(Self {
      merchant_account: merchant_account.to_string(),
    })
  }

  #[instrument(name = "paypal::create_charge_intent", skip(self), fields(merchant = %self.merchant_account))]
  pub async fn create_charge_intent(&self, order_id: Uuid, amount_cents: i64, currency: &str) -> Result<ChargeIntent> {
    if amount_cents <= 0 {
      return Err(AppError::Validation("Charge amount must be greater than zero.".to_string()));
    }
    // Simulated gateway round-trip
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let intent_id = format!("PAY-{}", Uuid::new_v4().simple());
    info!(
      "Wallet order {} created for order {} ({} {}).",
      intent_id, order_id, amount_cents, currency
    );
    Ok(ChargeIntent {
      client_secret: None,
      redirect_url: Some(format!("https://wallet.sandbox.example/checkout/{}", intent_id)),
      intent_id,
    })
  }

  #[instrument(name = "paypal::confirm_charge", skip(self))]
  pub async fn confirm_charge(&self, intent_id: &str, amount_cents: i64, currency: &str) -> Result<NormalizedPaymentResult> {
    if !intent_id.starts_with("PAY-") {
      return Err(AppError::Provider(format!(
        "Wallet does not recognize payment reference '{}'.",
        intent_id
      )));
    }
    // Simulated gateway round-trip; the sandbox declines a marker amount.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    let raw_status = if amount_cents % 1000 == 123 { "DECLINED" } else { "COMPLETED" };

    let status = normalize_status(raw_status)?;
    info!("Wallet order {} confirmed with status {:?}.", intent_id, status);
    Ok(NormalizedPaymentResult {
      intent_id: intent_id.to_string(),
      amount_cents,
      currency: currency.to_string(),
      status,
    })
  }

  /// Decodes a `PAYMENT.CAPTURE.*` webhook. The wallet reports amounts as
  /// decimal strings ("69.98"), converted to cents here.
  pub fn parse_webhook(&self, payload: &[u8]) -> Result<ProviderEvent> {
    let event: PaypalEvent = serde_json::from_slice(payload)
      .map_err(|e| AppError::Validation(format!("Invalid wallet webhook payload: {}", e)))?;

    if !event.event_type.starts_with("PAYMENT.CAPTURE.") {
      return Err(AppError::Validation(format!(
        "Unhandled wallet event type '{}'.",
        event.event_type
      )));
    }

    let resource = event.resource;
    let status = normalize_status(&resource.status)?;
    Ok(ProviderEvent {
      order_id: resource.custom_id,
      result: NormalizedPaymentResult {
        intent_id: resource.id,
        amount_cents: wallet_amount_to_cents(&resource.amount.value)?,
        currency: resource.amount.currency_code,
        status,
      },
    })
  }
}

/// Maps the wallet's state vocabulary onto the shared one. Unknown states
/// are protocol errors, never silently coerced.
pub fn normalize_status(raw: &str) -> Result<ProviderStatus> {
  match raw {
    "COMPLETED" => Ok(ProviderStatus::Succeeded),
    "CREATED" | "APPROVED" | "PENDING" => Ok(ProviderStatus::RequiresAction),
    "DECLINED" => Ok(ProviderStatus::Failed),
    "VOIDED" => Ok(ProviderStatus::Canceled),
    other => Err(AppError::Provider(format!("Unrecognized wallet status '{}'.", other))),
  }
}

/// Converts a wallet decimal amount string ("69.98") to integer cents.
/// At most two fraction digits; negative amounts are rejected.
pub fn wallet_amount_to_cents(value: &str) -> Result<i64> {
  let invalid = || AppError::Validation(format!("Invalid wallet amount '{}'.", value));

  let (whole, frac) = match value.split_once('.') {
    Some((w, f)) => (w, f),
    None => (value, ""),
  };
  if whole.is_empty() || whole.starts_with('-') || frac.len() > 2 {
    return Err(invalid());
  }
  let whole: i64 = whole.parse().map_err(|_| invalid())?;
  let frac: i64 = if frac.is_empty() {
    0
  } else {
    let parsed: i64 = frac.parse().map_err(|_| invalid())?;
    if frac.len() == 1 {
      parsed * 10
    } else {
      parsed
    }
  };
  Ok(whole * 100 + frac)
}

#[derive(Debug, Deserialize)]
struct PaypalEvent {
  event_type: String,
  resource: PaypalResource,
}

#[derive(Debug, Deserialize)]
struct PaypalResource {
  id: String,
  custom_id: Uuid,
  status: String,
  amount: PaypalAmount,
}

#[derive(Debug, Deserialize)]
struct PaypalAmount {
  currency_code: String,
  value: String,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn adapter() -> PayPalAdapter {
    PayPalAdapter::new("acct_test").unwrap()
  }

  #[test]
  fn vocabulary_normalizes_onto_the_shared_statuses() {
    assert_eq!(normalize_status("COMPLETED").unwrap(), ProviderStatus::Succeeded);
    assert_eq!(normalize_status("CREATED").unwrap(), ProviderStatus::RequiresAction);
    assert_eq!(normalize_status("APPROVED").unwrap(), ProviderStatus::RequiresAction);
    assert_eq!(normalize_status("DECLINED").unwrap(), ProviderStatus::Failed);
    assert_eq!(normalize_status("VOIDED").unwrap(), ProviderStatus::Canceled);
    assert!(matches!(normalize_status("MYSTERIOUS"), Err(AppError::Provider(_))));
  }

  #[test]
  fn wallet_amounts_convert_to_cents() {
    assert_eq!(wallet_amount_to_cents("69.98").unwrap(), 6998);
    assert_eq!(wallet_amount_to_cents("69.9").unwrap(), 6990);
    assert_eq!(wallet_amount_to_cents("69").unwrap(), 6900);
    assert_eq!(wallet_amount_to_cents("0.05").unwrap(), 5);
  }

  #[test]
  fn malformed_wallet_amounts_are_rejected() {
    for bad in ["", "-1.00", "69.987", "sixty-nine", "69.x"] {
      assert!(wallet_amount_to_cents(bad).is_err(), "expected '{bad}' to be rejected");
    }
  }

  #[tokio::test]
  async fn created_intent_carries_a_redirect_not_a_client_secret() {
    let intent = adapter()
      .create_charge_intent(Uuid::new_v4(), 6998, "USD")
      .await
      .unwrap();
    assert!(intent.intent_id.starts_with("PAY-"));
    assert!(intent.redirect_url.is_some());
    assert!(intent.client_secret.is_none());
  }

  #[tokio::test]
  async fn sandbox_marker_amount_is_declined() {
    let result = adapter().confirm_charge("PAY-abc", 2123, "USD").await.unwrap();
    assert_eq!(result.status, ProviderStatus::Failed);
  }

  #[test]
  fn webhook_decodes_decimal_amounts_into_cents() {
    let order_id = Uuid::new_v4();
    let payload = json!({
      "event_type": "PAYMENT.CAPTURE.COMPLETED",
      "resource": {
        "id": "PAY-42",
        "custom_id": order_id,
        "status": "COMPLETED",
        "amount": { "currency_code": "USD", "value": "69.98" }
      }
    });
    let event = adapter().parse_webhook(payload.to_string().as_bytes()).unwrap();
    assert_eq!(event.order_id, order_id);
    assert_eq!(event.result.amount_cents, 6998);
    assert_eq!(event.result.currency, "USD");
    assert_eq!(event.result.status, ProviderStatus::Succeeded);
  }
}
