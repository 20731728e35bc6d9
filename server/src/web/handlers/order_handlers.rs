// server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::orders;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;
use crate::workflows::contexts::PlaceOrderCtx;
use flywheel::{Outcome, Shared};

// --- Request DTO ---
#[derive(Deserialize, Debug)]
pub struct CreateOrderPayload {
  pub course_ids: Vec<Uuid>,
}

// --- Handler implementations ---

#[instrument(
  name = "handler::create_order",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id, requested = payload.course_ids.len())
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CreateOrderPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  info!(
    "Order creation attempt by user {} for {} course id(s).",
    auth_user.user_id,
    payload.course_ids.len()
  );

  // 1. Prepare the initial context for the place-order workflow
  let ctx = Shared::new(PlaceOrderCtx {
    app_state: app_state.get_ref().clone(),
    user_id: auth_user.user_id,
    course_ids: payload.course_ids.clone(),
    priced_lines: Vec::new(),
    created: None,
  });

  // 2. Run it
  match app_state.flywheel.run(ctx.clone()).await {
    Ok(Outcome::Completed) => {
      let created = { ctx.read().created.clone() };
      let detail = created.ok_or_else(|| {
        warn!("Place-order workflow completed but no order was recorded in the context.");
        AppError::Internal("Order creation completed, but order details are unavailable.".to_string())
      })?;

      info!(
        "Order {} created for user {}: total {} {}.",
        detail.order.id, auth_user.user_id, detail.order.total_cents, detail.order.currency
      );

      // 3. Respond with the aggregate
      Ok(HttpResponse::Created().json(json!({
        "message": "Order created.",
        "order": detail.order,
        "items": detail.items,
      })))
    }
    Ok(Outcome::Halted) => {
      warn!("Place-order workflow for user {} was halted.", auth_user.user_id);
      Err(AppError::WorkflowHalted)
    }
    Err(app_err) => {
      warn!("Place-order workflow failed for user {}: {:?}", auth_user.user_id, app_err);
      Err(app_err)
    }
  }
}

#[instrument(
  name = "handler::get_order",
  skip(app_state, path, auth_user),
  fields(user_id = %auth_user.user_id, order_id = %path.as_ref())
)]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();

  let detail = orders::get_order_for_user(&app_state.db_pool, auth_user.user_id, order_id).await?;
  Ok(HttpResponse::Ok().json(json!({
    "order": detail.order,
    "items": detail.items,
    "payment": detail.payment,
  })))
}
