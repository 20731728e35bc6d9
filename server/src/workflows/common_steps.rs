// server/src/workflows/common_steps.rs
use crate::services::notifications;
use crate::workflows::contexts::SendReceiptCtx;
use flywheel::{Control, FlowError, FlowResult, Shared};
use tracing::{info, instrument, warn};

/// Formats integer cents for human-facing receipt copy.
pub fn format_cents(amount_cents: i64) -> String {
  format!("${:.2}", amount_cents as f64 / 100.0)
}

#[instrument(name = "common_step::send_purchase_receipt", skip(ctx), err)]
pub async fn send_purchase_receipt_step(ctx: Shared<SendReceiptCtx>) -> FlowResult<Control> {
  let (recipient_email, order_id, total_display, config) = {
    let guard = ctx.read();
    info!(
      "Attempting to send purchase receipt for order {} to {}",
      guard.order_id, guard.recipient_email
    );
    (
      guard.recipient_email.clone(),
      guard.order_id,
      guard.order_total_display.clone(),
      guard.app_state.config.clone(),
    )
  }; // guard dropped before awaiting

  match notifications::send_receipt(
    &recipient_email,
    &config.receipt_sender,
    &format!("Your Coursebay order {} is confirmed", order_id),
    &format!(
      "<p>Thanks for your purchase!</p><p>Order {} for {} is confirmed; your courses are ready in your library.</p>",
      order_id, total_display
    ),
  )
  .await
  {
    Ok(sent_info) => {
      info!(
        "Purchase receipt sent for order {}. Message ID: {}",
        order_id, sent_info.message_id
      );
      Ok(Control::Advance)
    }
    Err(e) => {
      warn!("Failed to send purchase receipt for order {}: {:?}", order_id, e);
      Err(FlowError::Handler {
        source: anyhow::Error::new(e),
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::format_cents;

  #[test]
  fn cents_format_as_dollars() {
    assert_eq!(format_cents(6998), "$69.98");
    assert_eq!(format_cents(500), "$5.00");
    assert_eq!(format_cents(0), "$0.00");
  }
}
