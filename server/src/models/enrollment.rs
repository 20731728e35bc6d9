// server/src/models/enrollment.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Ownership record: the existence of this row IS the authorization proof
/// that the user may access the course's learning content.
///
/// Composite key (user_id, course_id). Created only by the settlement path
/// once an order for the course reaches `paid`; insert-skip-duplicates so
/// re-settlement is a no-op. `completed` is one-way: flipped by the progress
/// rollup when every lecture of the course is done, never unset.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserCourse {
  pub user_id: Uuid,
  pub course_id: Uuid,
  pub purchased_at: DateTime<Utc>,
  pub completed: bool,
  pub completed_at: Option<DateTime<Utc>>,
}

/// Enrollment joined with its course's display fields, for listings.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OwnedCourse {
  pub course_id: Uuid,
  pub title: String,
  pub thumbnail_url: Option<String>,
  pub purchased_at: DateTime<Utc>,
  pub completed: bool,
  pub completed_at: Option<DateTime<Utc>>,
}
