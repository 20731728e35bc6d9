// server/src/services/notifications.rs
use crate::errors::Result as AppResult;
use tracing::info;

#[derive(Debug)]
pub struct SentReceiptInfo {
  pub to: String,
  pub from: String,
  pub subject: String,
  pub message_id: String,
}

/// Mock mail transport for purchase receipts. Simulates latency and a
/// failure marker the same way the provider gateways are simulated.
pub async fn send_receipt(to: &str, from: &str, subject: &str, _html_body: &str) -> AppResult<SentReceiptInfo> {
  info!("Sending receipt: To='{}', From='{}', Subject='{}'", to, from, subject);
  tokio::time::sleep(std::time::Duration::from_millis(20)).await;

  if to.ends_with("@bounce.example") {
    tracing::warn!("Simulated receipt delivery failure for recipient: {}", to);
    return Err(crate::errors::AppError::Internal(
      "Simulated receipt delivery failure".to_string(),
    ));
  }

  let message_id = format!("receipt_{}", uuid::Uuid::new_v4());
  info!("Receipt sent. Message ID: {}", message_id);

  Ok(SentReceiptInfo {
    to: to.to_string(),
    from: from.to_string(),
    subject: subject.to_string(),
    message_id,
  })
}
