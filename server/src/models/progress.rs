// server/src/models/progress.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Per-lecture video progress, keyed (user_id, lecture_id).
///
/// Upsert-only: `progress` never decreases and `completed` never reverts to
/// false, regardless of the order in which updates arrive.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserLectureProgress {
  pub user_id: Uuid,
  pub lecture_id: Uuid,
  pub course_id: Uuid,
  /// 0-100.
  pub progress: i32,
  pub completed: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Per-quiz progress, keyed (user_id, lecture_id). Same monotonicity rules as
/// lecture progress; `answers` holds the latest submission verbatim.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserQuizProgress {
  pub user_id: Uuid,
  pub lecture_id: Uuid,
  pub course_id: Uuid,
  pub score: i32,
  pub answers: serde_json::Value,
  pub completed: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
