// server/src/services/cart.rs

//! Pricing/Cart Resolver: turns a client-supplied set of course ids into
//! priced order lines, snapshotting each course's current price and display
//! fields at resolution time. Pure read + projection; no writes.

use crate::db;
use crate::errors::{AppError, Result};
use crate::models::Course;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;

/// One priced course line, ready to become an immutable OrderItem.
#[derive(Debug, Clone, Serialize)]
pub struct PricedLine {
  pub course_id: Uuid,
  pub course_title: String,
  pub course_thumbnail: Option<String>,
  pub price_cents: i64,
}

impl PricedLine {
  fn from_course(course: &Course) -> Self {
    Self {
      course_id: course.id,
      course_title: course.title.clone(),
      course_thumbnail: course.thumbnail_url.clone(),
      price_cents: course.price_cents,
    }
  }
}

/// De-duplicates course ids preserving first-seen order.
pub fn dedup_preserving_order(course_ids: &[Uuid]) -> Vec<Uuid> {
  let mut seen = Vec::with_capacity(course_ids.len());
  for id in course_ids {
    if !seen.contains(id) {
      seen.push(*id);
    }
  }
  seen
}

/// The single summation authority for an order total.
pub fn order_total(lines: &[PricedLine]) -> i64 {
  lines.iter().map(|l| l.price_cents).sum()
}

/// Resolves a cart for `user_id`.
///
/// Fails `NotFound` if any id has no course. Courses the user already owns
/// are silently filtered out (re-purchase prevention); an empty result means
/// there is nothing left to buy and order creation rejects it.
#[instrument(name = "cart::resolve_cart", skip(pool), fields(user_id = %user_id, requested = course_ids.len()))]
pub async fn resolve_cart(pool: &PgPool, user_id: Uuid, course_ids: &[Uuid]) -> Result<Vec<PricedLine>> {
  let unique_ids = dedup_preserving_order(course_ids);
  if unique_ids.is_empty() {
    return Ok(Vec::new());
  }

  let courses = db::catalog::fetch_courses_by_ids(pool, &unique_ids).await?;
  let by_id: HashMap<Uuid, Course> = courses.into_iter().map(|c| (c.id, c)).collect();

  if let Some(missing) = unique_ids.iter().find(|id| !by_id.contains_key(*id)) {
    return Err(AppError::NotFound(format!("Course with ID {} not found.", missing)));
  }

  let owned = db::enrollments::owned_course_ids(pool, user_id, &unique_ids).await?;
  let skipped = owned.len();

  let lines: Vec<PricedLine> = unique_ids
    .iter()
    .filter(|id| !owned.contains(*id))
    .map(|id| PricedLine::from_course(&by_id[id]))
    .collect();

  info!(
    "Cart resolved for user {}: {} line(s), {} already-owned course(s) skipped.",
    user_id,
    lines.len(),
    skipped
  );
  Ok(lines)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn line(price_cents: i64) -> PricedLine {
    PricedLine {
      course_id: Uuid::new_v4(),
      course_title: "Course".to_string(),
      course_thumbnail: None,
      price_cents,
    }
  }

  #[test]
  fn dedup_keeps_first_seen_order() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let c = Uuid::new_v4();
    assert_eq!(dedup_preserving_order(&[a, b, a, c, b]), vec![a, b, c]);
  }

  #[test]
  fn dedup_of_empty_input_is_empty() {
    assert!(dedup_preserving_order(&[]).is_empty());
  }

  #[test]
  fn order_total_is_the_exact_sum_of_line_prices() {
    // $49.99 + $19.99 == $69.98
    let lines = vec![line(4999), line(1999)];
    assert_eq!(order_total(&lines), 6998);
  }

  #[test]
  fn order_total_of_no_lines_is_zero() {
    assert_eq!(order_total(&[]), 0);
  }
}
