// server/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{PaymentMethod, PaymentStatus};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::workflows::contexts::{ActiveCharge, InitiatePaymentCtx, SettleOrderCtx};
use flywheel::{Outcome, Shared};

// --- Request DTO ---
#[derive(Deserialize, Debug)]
pub struct InitiatePaymentPayload {
  pub method: PaymentMethod,
}

// --- Handler implementations ---

#[instrument(
  name = "handler::initiate_payment",
  skip(app_state, path, payload, auth_user),
  fields(user_id = %auth_user.user_id, order_id = %path.as_ref(), method = ?payload.method)
)]
pub async fn initiate_payment_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<InitiatePaymentPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  info!(
    "Payment initiation attempt by user {} for order {} via {}.",
    auth_user.user_id, order_id, payload.method
  );

  let ctx = Shared::new(InitiatePaymentCtx {
    app_state: app_state.get_ref().clone(),
    user_id: auth_user.user_id,
    order_id,
    requested_method: payload.method,
    order: None,
    charge: ActiveCharge::None,
    intent: None,
  });

  match app_state.flywheel.run(ctx.clone()).await {
    Ok(Outcome::Completed) => {
      let intent = { ctx.read().intent.clone() };
      let intent = intent.ok_or_else(|| {
        warn!("Payment workflow completed for order {} but no intent was recorded.", order_id);
        AppError::Internal("Payment initiation completed, but the charge reference is unavailable.".to_string())
      })?;

      Ok(HttpResponse::Ok().json(json!({
        "message": "Payment initiated.",
        "orderId": order_id,
        "method": payload.method,
        "intentId": intent.intent_id,
        "clientSecret": intent.client_secret,
        "redirectUrl": intent.redirect_url,
      })))
    }
    Ok(Outcome::Halted) => {
      // The branch step halts when no provider arm matched.
      warn!("Payment workflow for order {} was halted before a charge was created.", order_id);
      Err(AppError::Provider("Payment could not be routed to a provider.".to_string()))
    }
    Err(app_err) => {
      warn!("Payment workflow failed for order {}: {:?}", order_id, app_err);
      Err(app_err)
    }
  }
}

/// Synchronous confirmation: poll the provider for the order's recorded
/// intent and settle with the result. The client calls this after finishing
/// the provider-side flow; the webhook path covers asynchronous delivery of
/// the same settlement (both are idempotent per order).
#[instrument(
  name = "handler::confirm_payment",
  skip(app_state, path, auth_user),
  fields(user_id = %auth_user.user_id, order_id = %path.as_ref())
)]
pub async fn confirm_payment_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();

  // Resolve the provider from the order before entering the workflow.
  let order = db::orders::fetch_order(&app_state.db_pool, order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Order with ID {} not found.", order_id)))?;
  if order.user_id != auth_user.user_id {
    return Err(AppError::Auth("Order belongs to a different user.".to_string()));
  }
  let provider = order
    .payment_method
    .ok_or_else(|| AppError::Validation(format!("Payment was never initiated for order {}.", order_id)))?;

  let ctx = Shared::new(SettleOrderCtx {
    app_state: app_state.get_ref().clone(),
    provider,
    payload: None,
    signature: None,
    order_id: Some(order_id),
    result: None,
    outcome: None,
    receipt_sent: false,
  });

  match app_state.flywheel.run(ctx.clone()).await {
    Ok(Outcome::Completed) => {
      let outcome = { ctx.read().outcome.clone() };
      let outcome = outcome.ok_or_else(|| {
        AppError::Internal("Settlement completed, but its outcome is unavailable.".to_string())
      })?;

      let paid = outcome.payment_status == PaymentStatus::Paid;
      info!(
        "Confirm-payment finished for order {}: status {:?}, {} course(s) granted.",
        order_id, outcome.payment_status, outcome.courses_granted
      );
      Ok(HttpResponse::Ok().json(json!({
        "message": if paid { "Payment confirmed." } else { "Payment did not complete; you can retry checkout." },
        "orderId": outcome.order_id,
        "paymentStatus": outcome.payment_status,
        "coursesGranted": outcome.courses_granted,
      })))
    }
    Ok(Outcome::Halted) => {
      warn!("Settlement workflow for order {} was halted.", order_id);
      Err(AppError::WorkflowHalted)
    }
    Err(app_err) => {
      warn!("Settlement workflow failed for order {}: {:?}", order_id, app_err);
      Err(app_err)
    }
  }
}
