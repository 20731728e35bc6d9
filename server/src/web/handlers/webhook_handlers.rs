// server/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::{error, info, instrument, warn};

use crate::errors::AppError;
use crate::models::PaymentMethod;
use crate::services::payments::ProviderAdapter;
use crate::state::AppState;
use crate::workflows::contexts::SettleOrderCtx;
use flywheel::{Outcome, Shared};

// --- Handler implementation ---

#[instrument(
  name = "handler::provider_webhook",
  skip(app_state, req, provider_path, body),
  fields(provider = %provider_path.as_ref(), payload_bytes = body.len())
)]
pub async fn provider_webhook_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  provider_path: web::Path<String>,
  body: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let provider_name = provider_path.into_inner();
  let provider: PaymentMethod = provider_name
    .parse()
    .map_err(|_| AppError::NotFound(format!("Unknown payment provider '{}'.", provider_name)))?;
  info!(
    "Received webhook from provider '{}'. Payload size: {} bytes.",
    provider_name,
    body.len()
  );

  // Each provider transmits its signature in its own header.
  let adapter = ProviderAdapter::for_method(provider, &app_state.config)?;
  let signature = req
    .headers()
    .get(adapter.signature_header())
    .and_then(|h| h.to_str().ok())
    .map(String::from);

  let ctx = Shared::new(SettleOrderCtx {
    app_state: app_state.get_ref().clone(),
    provider,
    payload: Some(body),
    signature,
    order_id: None,
    result: None,
    outcome: None,
    receipt_sent: false,
  });

  match app_state.flywheel.run(ctx.clone()).await {
    Ok(Outcome::Completed) => {
      let guard = ctx.read();
      info!(
        "Webhook settlement finished for provider '{}'. Order: {:?}, outcome: {:?}.",
        provider_name,
        guard.order_id,
        guard.outcome.as_ref().map(|o| o.payment_status)
      );
      // Acknowledge receipt; providers retry on anything else.
      Ok(HttpResponse::Ok().finish())
    }
    Ok(Outcome::Halted) => {
      // Not an error from the provider's perspective; acknowledge so the
      // event is not redelivered forever.
      warn!("Webhook settlement for provider '{}' halted; acknowledging.", provider_name);
      Ok(HttpResponse::Ok().json(serde_json::json!({"status": "acknowledged_halted"})))
    }
    Err(app_err) => {
      // Signature/decoding/settlement failures surface as HTTP errors and
      // the provider will retry delivery.
      error!("Webhook settlement for provider '{}' failed: {:?}", provider_name, app_err);
      Err(app_err)
    }
  }
}
