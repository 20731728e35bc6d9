// server/src/workflows/payment.rs

//! Payment initiation: load and authorize the pending order, install the
//! provider-scoped charge context, route into the chosen provider's
//! sub-workflow, and record the resulting charge-intent reference on the
//! order.

use crate::db;
use crate::errors::AppError;
use crate::models::{PaymentMethod, PaymentStatus};
use crate::state::AppState;
use crate::workflows::contexts::{ActiveCharge, ChargeCtx, InitiatePaymentCtx};
use crate::workflows::factories::{paypal_charge_workflow_factory, stripe_charge_workflow_factory};
use flywheel::{Control, FlowError, Flywheel, Shared, Workflow};
use std::sync::Arc;
use tracing::{info, warn};

pub fn register_payment_workflow(flywheel: &Arc<Flywheel<AppError>>, _app_state: &AppState) {
  let mut wf = Workflow::<InitiatePaymentCtx, AppError>::new(&[
    ("load_order_for_payment", false, None),
    ("init_charge_context", false, None),
    ("route_provider", false, None),
    ("record_charge_intent", false, None),
  ]);

  // Step 1: load the order, enforce ownership, require `pending`
  wf.on_step("load_order_for_payment", |ctx: Shared<InitiatePaymentCtx>| {
    Box::pin(async move {
      let (pool, user_id, order_id) = {
        let guard = ctx.read();
        (guard.app_state.db_pool.clone(), guard.user_id, guard.order_id)
      };

      let order = db::orders::fetch_order(&pool, order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order with ID {} not found.", order_id)))?;
      if order.user_id != user_id {
        return Err(AppError::Auth("Order belongs to a different user.".to_string()));
      }
      if order.payment_status != PaymentStatus::Pending {
        return Err(AppError::Conflict(format!(
          "Order {} is not awaiting payment (status {:?}).",
          order.id, order.payment_status
        )));
      }

      info!(
        "Payment initiation for order {}: {} {} via {}.",
        order.id,
        order.total_cents,
        order.currency,
        ctx.read().requested_method
      );
      ctx.write().order = Some(order);
      Ok::<_, AppError>(Control::Advance)
    })
  });

  // Step 2: install the provider-scoped charge context
  wf.on_step("init_charge_context", |ctx: Shared<InitiatePaymentCtx>| {
    Box::pin(async move {
      let (config, method, order) = {
        let guard = ctx.read();
        (guard.app_state.config.clone(), guard.requested_method, guard.order.clone())
      };
      let order = order.ok_or_else(|| AppError::Internal("Order not loaded before charge context init.".to_string()))?;

      let merchant_account = match method {
        PaymentMethod::Stripe => config.stripe_merchant_account.clone(),
        PaymentMethod::Paypal => config.paypal_merchant_account.clone(),
      };
      let charge_ctx = Shared::new(ChargeCtx {
        order_id: order.id,
        amount_cents: order.total_cents,
        currency: order.currency.clone(),
        merchant_account,
        intent: None,
      });

      {
        let mut guard = ctx.write();
        guard.charge = match method {
          PaymentMethod::Stripe => ActiveCharge::Stripe(charge_ctx),
          PaymentMethod::Paypal => ActiveCharge::Paypal(charge_ctx),
        };
      }
      Ok::<_, AppError>(Control::Advance)
    })
  });

  // Step 3: branch into the chosen provider's charge sub-workflow
  wf.branches_for_step::<ChargeCtx>("route_provider")
    .arm_with(stripe_charge_workflow_factory, |ctx: Shared<InitiatePaymentCtx>| {
      match &ctx.read().charge {
        ActiveCharge::Stripe(charge) => Ok(charge.clone()),
        _ => Err(FlowError::ExtractFailure {
          step: "route_provider".to_string(),
          source: anyhow::anyhow!("charge context not initialized for the card provider"),
        }),
      }
    })
    .when(|ctx: Shared<InitiatePaymentCtx>| ctx.read().requested_method == PaymentMethod::Stripe)
    .arm_with(paypal_charge_workflow_factory, |ctx: Shared<InitiatePaymentCtx>| {
      match &ctx.read().charge {
        ActiveCharge::Paypal(charge) => Ok(charge.clone()),
        _ => Err(FlowError::ExtractFailure {
          step: "route_provider".to_string(),
          source: anyhow::anyhow!("charge context not initialized for the wallet provider"),
        }),
      }
    })
    .when(|ctx: Shared<InitiatePaymentCtx>| ctx.read().requested_method == PaymentMethod::Paypal)
    .if_no_arm_matches(Control::Halt)
    .seal(false);

  // After-hook for "route_provider": surface the created intent on the root
  // context, or fail the run if the provider produced none.
  wf.after_step("route_provider", |ctx: Shared<InitiatePaymentCtx>| {
    Box::pin(async move {
      let intent = {
        let guard = ctx.read();
        match &guard.charge {
          ActiveCharge::Stripe(charge) | ActiveCharge::Paypal(charge) => charge.read().intent.clone(),
          ActiveCharge::None => None,
        }
      };

      match intent {
        Some(intent) => {
          ctx.write().intent = Some(intent);
          Ok::<_, AppError>(Control::Advance)
        }
        None => {
          warn!("Provider sub-workflow finished without a charge intent.");
          Err(AppError::Provider("Payment provider returned no charge intent.".to_string()))
        }
      }
    })
  });

  // Step 4: persist the intent reference on the order
  wf.on_step("record_charge_intent", |ctx: Shared<InitiatePaymentCtx>| {
    Box::pin(async move {
      let (pool, order_id, method, intent) = {
        let guard = ctx.read();
        (
          guard.app_state.db_pool.clone(),
          guard.order_id,
          guard.requested_method,
          guard.intent.clone(),
        )
      };
      let intent = intent.ok_or_else(|| AppError::Internal("Charge intent missing after provider routing.".to_string()))?;

      let client_data = intent.client_secret.as_deref().or(intent.redirect_url.as_deref());
      let order = db::orders::record_charge_intent(&pool, order_id, method, &intent.intent_id, client_data).await?;
      info!("Charge intent {} recorded on order {}.", intent.intent_id, order.id);
      ctx.write().order = Some(order);
      Ok::<_, AppError>(Control::Advance)
    })
  });

  flywheel.register(wf);
  info!("Payment initiation workflow registered.");
}
