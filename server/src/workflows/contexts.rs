// server/src/workflows/contexts.rs

//! Underlying data structs for the flywheel workflows. Handlers receive
//! these wrapped in `flywheel::Shared`.

use crate::models::{Order, PaymentMethod};
use crate::services::cart::PricedLine;
use crate::services::orders::OrderDetail;
use crate::services::payments::{ChargeIntent, NormalizedPaymentResult};
use crate::services::settlement::SettlementOutcome;
use crate::state::AppState;
use flywheel::Shared;
use uuid::Uuid;

// --- Order placement ---

#[derive(Clone)]
pub struct PlaceOrderCtx {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub course_ids: Vec<Uuid>,
  // Populated by the workflow:
  pub priced_lines: Vec<PricedLine>,
  pub created: Option<OrderDetail>,
}

// --- Payment initiation ---

/// Scoped context the provider sub-workflows operate on (the branch S type).
#[derive(Debug, Clone)]
pub struct ChargeCtx {
  pub order_id: Uuid,
  pub amount_cents: i64,
  pub currency: String,
  pub merchant_account: String,
  pub intent: Option<ChargeIntent>,
}

/// Which provider's charge context is active for this run. Each variant
/// holds the `Shared<ChargeCtx>` its sub-workflow locks independently.
#[derive(Clone)]
pub enum ActiveCharge {
  None,
  Stripe(Shared<ChargeCtx>),
  Paypal(Shared<ChargeCtx>),
}

#[derive(Clone)]
pub struct InitiatePaymentCtx {
  pub app_state: AppState,
  pub user_id: Uuid,
  pub order_id: Uuid,
  pub requested_method: PaymentMethod,
  // Populated by the workflow:
  pub order: Option<Order>,
  pub charge: ActiveCharge,
  pub intent: Option<ChargeIntent>,
}

// --- Settlement ---

/// Context for the settlement workflow. Two entry shapes share it: webhook
/// delivery fills `payload`/`signature`; the synchronous confirm path fills
/// `order_id` and leaves `payload` empty so the poll step runs instead.
#[derive(Clone)]
pub struct SettleOrderCtx {
  pub app_state: AppState,
  pub provider: PaymentMethod,
  pub payload: Option<actix_web::web::Bytes>,
  pub signature: Option<String>,
  // Populated by the workflow (or pre-set on the confirm path):
  pub order_id: Option<Uuid>,
  pub result: Option<NormalizedPaymentResult>,
  pub outcome: Option<SettlementOutcome>,
  pub receipt_sent: bool,
}

// --- Notifications ---

#[derive(Clone)]
pub struct SendReceiptCtx {
  pub app_state: AppState,
  pub recipient_email: String,
  pub order_id: Uuid,
  pub order_total_display: String,
}
