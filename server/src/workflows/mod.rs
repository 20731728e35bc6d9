// server/src/workflows/mod.rs

//! Defines and registers the flywheel workflows of the marketplace.

use crate::errors::AppError;
use crate::state::AppState;
use flywheel::Flywheel;
use std::sync::Arc;

pub mod common_steps; // reusable individual steps
pub mod contexts; // context structs for every workflow
pub mod factories; // factories for provider-scoped charge sub-workflows

pub mod payment;
pub mod place_order;
pub mod settlement;

/// Registers every workflow with the flywheel registry. Called once at
/// application startup.
pub fn register_all_workflows(flywheel: &Arc<Flywheel<AppError>>, app_state: &AppState) {
  tracing::info!("Registering flywheel workflows...");

  place_order::register_place_order_workflow(flywheel, app_state);
  payment::register_payment_workflow(flywheel, app_state);
  settlement::register_settlement_workflow(flywheel, app_state);

  tracing::info!("All application workflows registered.");
}
