// server/src/workflows/settlement.rs

//! Settlement: reconcile a provider confirmation with its order.
//!
//! Two entry shapes share this workflow. Webhook delivery carries a raw
//! provider payload (signature check + decode steps run, the poll step is
//! skipped); the synchronous confirm path carries an order id and no payload
//! (decode steps are skipped, the poll step asks the provider directly).
//! Both converge on the settle step; the receipt step is optional and its
//! failure never fails a settlement.

use crate::db;
use crate::errors::AppError;
use crate::models::PaymentStatus;
use crate::services::payments::ProviderAdapter;
use crate::services::settlement;
use crate::state::AppState;
use crate::workflows::common_steps;
use crate::workflows::contexts::{SendReceiptCtx, SettleOrderCtx};
use flywheel::{Control, Flywheel, Shared, SkipWhen, Workflow};
use std::sync::Arc;
use tracing::{info, warn};

pub fn register_settlement_workflow(flywheel: &Arc<Flywheel<AppError>>, _app_state: &AppState) {
  let no_payload: SkipWhen<SettleOrderCtx> = Arc::new(|ctx: Shared<SettleOrderCtx>| ctx.read().payload.is_none());
  let already_confirmed: SkipWhen<SettleOrderCtx> = Arc::new(|ctx: Shared<SettleOrderCtx>| ctx.read().result.is_some());

  let mut wf = Workflow::<SettleOrderCtx, AppError>::new(&[
    ("verify_webhook_signature", true, Some(no_payload.clone())),
    ("decode_provider_event", false, Some(no_payload)),
    ("poll_provider_confirmation", false, Some(already_confirmed)),
    ("apply_settlement", false, None),
    ("send_purchase_receipt", true, None),
  ]);

  // Step 1 (webhook path): verify the provider's signature header
  wf.on_step("verify_webhook_signature", |ctx: Shared<SettleOrderCtx>| {
    Box::pin(async move {
      let (provider, config, signature) = {
        let guard = ctx.read();
        (guard.provider, guard.app_state.config.clone(), guard.signature.clone())
      };

      let adapter = ProviderAdapter::for_method(provider, &config)?;
      adapter.verify_signature(signature.as_deref())?;
      if signature.is_none() {
        warn!("Webhook from {} carried no signature header; accepting (mock transport).", provider);
      }
      Ok::<_, AppError>(Control::Advance)
    })
  });

  // Step 2 (webhook path): decode the provider payload into an order id and
  // a normalized result
  wf.on_step("decode_provider_event", |ctx: Shared<SettleOrderCtx>| {
    Box::pin(async move {
      let (provider, config, payload) = {
        let guard = ctx.read();
        (guard.provider, guard.app_state.config.clone(), guard.payload.clone())
      };
      let payload =
        payload.ok_or_else(|| AppError::Internal("Decode step reached without a webhook payload.".to_string()))?;

      let adapter = ProviderAdapter::for_method(provider, &config)?;
      let event = adapter.parse_webhook(&payload)?;
      info!(
        "Webhook from {} decoded: order {}, intent {}, status {:?}.",
        provider, event.order_id, event.result.intent_id, event.result.status
      );

      {
        let mut guard = ctx.write();
        guard.order_id = Some(event.order_id);
        guard.result = Some(event.result);
      }
      Ok::<_, AppError>(Control::Advance)
    })
  });

  // Step 3 (confirm path): no webhook result yet, ask the provider about
  // the intent recorded at initiation time
  wf.on_step("poll_provider_confirmation", |ctx: Shared<SettleOrderCtx>| {
    Box::pin(async move {
      let (provider, config, pool, order_id) = {
        let guard = ctx.read();
        (
          guard.provider,
          guard.app_state.config.clone(),
          guard.app_state.db_pool.clone(),
          guard.order_id,
        )
      };
      let order_id =
        order_id.ok_or_else(|| AppError::Internal("Poll step reached without an order id.".to_string()))?;

      let order = db::orders::fetch_order(&pool, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order with ID {} not found.", order_id)))?;
      let intent_id = order.provider_intent_id.clone().ok_or_else(|| {
        AppError::Validation(format!("Payment was never initiated for order {}.", order_id))
      })?;

      let adapter = ProviderAdapter::for_method(provider, &config)?;
      let result = adapter.confirm_charge(&intent_id, order.total_cents, &order.currency).await?;
      info!(
        "Provider {} confirmed intent {} with status {:?}.",
        provider, intent_id, result.status
      );

      ctx.write().result = Some(result);
      Ok::<_, AppError>(Control::Advance)
    })
  });

  // Step 4: the financial transition + entitlement grant
  wf.on_step("apply_settlement", |ctx: Shared<SettleOrderCtx>| {
    Box::pin(async move {
      let (pool, provider, order_id, result) = {
        let guard = ctx.read();
        (
          guard.app_state.db_pool.clone(),
          guard.provider,
          guard.order_id,
          guard.result.clone(),
        )
      };
      let order_id =
        order_id.ok_or_else(|| AppError::Internal("Settle step reached without an order id.".to_string()))?;
      let result =
        result.ok_or_else(|| AppError::Internal("Settle step reached without a provider result.".to_string()))?;

      let outcome = settlement::settle(&pool, order_id, provider, &result).await?;
      ctx.write().outcome = Some(outcome);
      Ok::<_, AppError>(Control::Advance)
    })
  });

  // Step 5 (optional): purchase receipt for paid settlements. Failures are
  // logged and swallowed; the settlement already stands.
  wf.on_step("send_purchase_receipt", |ctx: Shared<SettleOrderCtx>| {
    Box::pin(async move {
      let (app_state, pool, outcome) = {
        let guard = ctx.read();
        (guard.app_state.clone(), guard.app_state.db_pool.clone(), guard.outcome.clone())
      };
      let Some(outcome) = outcome else {
        warn!("Skipping receipt: settlement outcome missing.");
        return Ok::<_, AppError>(Control::Advance);
      };
      if outcome.payment_status != PaymentStatus::Paid {
        info!("Skipping receipt for order {}: settlement was not paid.", outcome.order_id);
        return Ok(Control::Advance);
      }

      let Some(order) = db::orders::fetch_order(&pool, outcome.order_id).await? else {
        warn!("Skipping receipt: order {} vanished after settlement.", outcome.order_id);
        return Ok(Control::Advance);
      };
      // Display attributes come from the identity collaborator; stubbed the
      // same way the identity transport is.
      let recipient_email = format!("user_{}@example.com", order.user_id.simple());

      let receipt_ctx = Shared::new(SendReceiptCtx {
        app_state,
        recipient_email,
        order_id: order.id,
        order_total_display: common_steps::format_cents(order.total_cents),
      });

      match common_steps::send_purchase_receipt_step(receipt_ctx).await {
        Ok(Control::Advance) => {
          ctx.write().receipt_sent = true;
          Ok(Control::Advance)
        }
        Ok(control) => Ok(control),
        Err(flow_err) => {
          warn!("Purchase receipt step failed for order {}: {:?}", order.id, flow_err);
          ctx.write().receipt_sent = false;
          // Optional step: the settlement stands regardless.
          Ok(Control::Advance)
        }
      }
    })
  });

  flywheel.register(wf);
  info!("Settlement workflow registered.");
}
