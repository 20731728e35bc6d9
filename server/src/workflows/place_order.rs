// server/src/workflows/place_order.rs

//! Order placement: validate the requested cart, price it against the
//! catalog, persist the pending order with its immutable items.

use crate::errors::AppError;
use crate::services::{cart, orders};
use crate::state::AppState;
use crate::workflows::contexts::PlaceOrderCtx;
use flywheel::{Control, Flywheel, Shared, Workflow};
use std::sync::Arc;
use tracing::{info, warn};

pub fn register_place_order_workflow(flywheel: &Arc<Flywheel<AppError>>, _app_state: &AppState) {
  let mut wf = Workflow::<PlaceOrderCtx, AppError>::new(&[
    ("validate_order_request", false, None),
    ("price_cart", false, None),
    ("persist_order", false, None),
  ]);

  // Step 1: reject empty requests before touching the catalog
  wf.on_step("validate_order_request", |ctx: Shared<PlaceOrderCtx>| {
    Box::pin(async move {
      let requested = { ctx.read().course_ids.len() };
      if requested == 0 {
        warn!("Order request with an empty cart rejected.");
        return Err(AppError::Validation("Cart must contain at least one course.".to_string()));
      }
      info!("Order request validated: {} course id(s).", requested);
      Ok::<_, AppError>(Control::Advance)
    })
  });

  // Step 2: resolve the cart into priced lines (dedup, existence check,
  // already-owned filter, price snapshot)
  wf.on_step("price_cart", |ctx: Shared<PlaceOrderCtx>| {
    Box::pin(async move {
      let (pool, user_id, course_ids) = {
        let guard = ctx.read();
        (guard.app_state.db_pool.clone(), guard.user_id, guard.course_ids.clone())
      };

      let lines = cart::resolve_cart(&pool, user_id, &course_ids).await?;
      if lines.is_empty() {
        // Everything in the cart was filtered as already owned.
        return Err(AppError::Validation(
          "No purchasable courses in the cart; already-owned courses are skipped.".to_string(),
        ));
      }
      ctx.write().priced_lines = lines;
      Ok::<_, AppError>(Control::Advance)
    })
  });

  // Step 3: create the pending order and its items in one transaction
  wf.on_step("persist_order", |ctx: Shared<PlaceOrderCtx>| {
    Box::pin(async move {
      let (pool, user_id, currency, lines) = {
        let guard = ctx.read();
        (
          guard.app_state.db_pool.clone(),
          guard.user_id,
          guard.app_state.config.currency.clone(),
          guard.priced_lines.clone(),
        )
      };

      let detail = orders::create_order(&pool, user_id, &currency, &lines).await?;
      ctx.write().created = Some(detail);
      Ok::<_, AppError>(Control::Advance)
    })
  });

  flywheel.register(wf);
  info!("Place-order workflow registered.");
}
