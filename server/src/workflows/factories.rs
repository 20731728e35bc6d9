// server/src/workflows/factories.rs

//! Factory functions producing the provider-scoped charge sub-workflows for
//! the payment workflow's branch point. Each factory yields a
//! `Workflow<ChargeCtx, AppError>` whose handlers speak to one provider
//! adapter; everything provider-specific stays behind these arms.

use crate::errors::AppError;
use crate::services::payments::{PayPalAdapter, ProviderAdapter, StripeAdapter};
use crate::workflows::contexts::{ChargeCtx, InitiatePaymentCtx};
use flywheel::{Control, FlowError, Shared, Workflow};
use std::sync::Arc;
use tracing::{info, instrument};

// Factory for the card-network provider (Stripe)
#[instrument(
  name = "factory::stripe_charge",
  skip(root_ctx),
  fields(order_id = %root_ctx.read().order_id),
  err(Display)
)]
pub async fn stripe_charge_workflow_factory(
  root_ctx: Shared<InitiatePaymentCtx>,
) -> Result<Arc<Workflow<ChargeCtx, AppError>>, FlowError> {
  info!("Building card-network charge workflow.");

  let mut wf = Workflow::<ChargeCtx, AppError>::new(&[("create_card_intent", false, None)]);

  wf.on_step("create_card_intent", |charge_ctx: Shared<ChargeCtx>| {
    Box::pin(async move {
      let (order_id, amount_cents, currency, merchant_account) = {
        let guard = charge_ctx.read();
        (
          guard.order_id,
          guard.amount_cents,
          guard.currency.clone(),
          guard.merchant_account.clone(),
        )
      };

      let adapter = ProviderAdapter::Stripe(StripeAdapter::new(&merchant_account)?);
      let intent = adapter.create_charge_intent(order_id, amount_cents, &currency).await?;
      info!(
        "{} intent {} ready for order {}.",
        adapter.method(),
        intent.intent_id,
        order_id
      );

      charge_ctx.write().intent = Some(intent);
      Ok::<_, AppError>(Control::Advance)
    })
  });

  Ok(Arc::new(wf))
}

// Factory for the wallet-redirect provider (PayPal)
#[instrument(
  name = "factory::paypal_charge",
  skip(root_ctx),
  fields(order_id = %root_ctx.read().order_id),
  err(Display)
)]
pub async fn paypal_charge_workflow_factory(
  root_ctx: Shared<InitiatePaymentCtx>,
) -> Result<Arc<Workflow<ChargeCtx, AppError>>, FlowError> {
  info!("Building wallet charge workflow.");

  let mut wf = Workflow::<ChargeCtx, AppError>::new(&[("create_wallet_order", false, None)]);

  wf.on_step("create_wallet_order", |charge_ctx: Shared<ChargeCtx>| {
    Box::pin(async move {
      let (order_id, amount_cents, currency, merchant_account) = {
        let guard = charge_ctx.read();
        (
          guard.order_id,
          guard.amount_cents,
          guard.currency.clone(),
          guard.merchant_account.clone(),
        )
      };

      let adapter = ProviderAdapter::Paypal(PayPalAdapter::new(&merchant_account)?);
      let intent = adapter.create_charge_intent(order_id, amount_cents, &currency).await?;
      info!(
        "{} order {} ready for order {}; buyer approval at {:?}.",
        adapter.method(),
        intent.intent_id,
        order_id,
        intent.redirect_url
      );

      charge_ctx.write().intent = Some(intent);
      Ok::<_, AppError>(Control::Advance)
    })
  });

  Ok(Arc::new(wf))
}
