// server/src/services/progress.rs

//! Progress Tracker: per-lecture and per-quiz completion recording with a
//! course-level rollup.
//!
//! Writes are upserts keyed (user_id, lecture_id) whose statements enforce
//! monotonicity (progress/score never decrease, `completed` never reverts),
//! so concurrent deliveries for different lectures — or re-deliveries for
//! the same lecture — converge without locks. After any write that ends
//! completed, the rollup recomputes course completion from authoritative
//! counts and one-way flips the enrollment row.

use crate::db;
use crate::errors::{AppError, Result};
use crate::models::{Lecture, LectureKind, UserLectureProgress, UserQuizProgress};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

/// A quiz counts as completed from this score upward, mirroring the 100%
/// threshold on video progress.
pub const QUIZ_PASSING_SCORE: i32 = 70;

/// `completed` is true when the explicit flag is set or the watched share
/// reaches 100%.
pub fn lecture_completed(completed_flag: bool, progress: i32) -> bool {
  completed_flag || progress >= 100
}

/// `completed` is true when the explicit flag is set or the score passes.
pub fn quiz_completed(completed_flag: bool, score: i32) -> bool {
  completed_flag || score >= QUIZ_PASSING_SCORE
}

pub fn clamp_progress(progress: i32) -> i32 {
  progress.clamp(0, 100)
}

#[derive(Debug, Clone, Serialize)]
pub struct LectureProgressOutcome {
  pub progress: UserLectureProgress,
  pub course_completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizProgressOutcome {
  pub progress: UserQuizProgress,
  pub course_completed: bool,
}

/// Records video progress for a lecture the user owns.
#[instrument(name = "progress::record_lecture", skip(pool), fields(user_id = %user_id, lecture_id = %lecture_id))]
pub async fn record_lecture_progress(
  pool: &PgPool,
  user_id: Uuid,
  course_id: Uuid,
  lecture_id: Uuid,
  progress: i32,
  completed: bool,
) -> Result<LectureProgressOutcome> {
  let lecture = load_owned_lecture(pool, user_id, course_id, lecture_id).await?;
  if lecture.kind != LectureKind::Video {
    return Err(AppError::Validation(format!(
      "Lecture {} is a quiz; submit quiz progress instead.",
      lecture_id
    )));
  }

  let progress = clamp_progress(progress);
  let completed = lecture_completed(completed, progress);
  let row = db::progress::upsert_lecture_progress(pool, user_id, lecture_id, course_id, progress, completed).await?;

  let course_completed = rollup_if_completed(pool, user_id, course_id, row.completed).await?;
  Ok(LectureProgressOutcome {
    progress: row,
    course_completed,
  })
}

/// Records a quiz submission for a lecture the user owns.
#[instrument(name = "progress::record_quiz", skip(pool, answers), fields(user_id = %user_id, lecture_id = %lecture_id))]
pub async fn record_quiz_progress(
  pool: &PgPool,
  user_id: Uuid,
  course_id: Uuid,
  lecture_id: Uuid,
  score: i32,
  answers: serde_json::Value,
  completed: bool,
) -> Result<QuizProgressOutcome> {
  let lecture = load_owned_lecture(pool, user_id, course_id, lecture_id).await?;
  if lecture.kind != LectureKind::Quiz {
    return Err(AppError::Validation(format!(
      "Lecture {} is not a quiz; submit lecture progress instead.",
      lecture_id
    )));
  }

  let completed = quiz_completed(completed, score);
  let row = db::progress::upsert_quiz_progress(pool, user_id, lecture_id, course_id, score, &answers, completed).await?;

  let course_completed = rollup_if_completed(pool, user_id, course_id, row.completed).await?;
  Ok(QuizProgressOutcome {
    progress: row,
    course_completed,
  })
}

/// Resolves the lecture, checks it belongs to the claimed course, and checks
/// the enrollment row that proves the user may consume it.
async fn load_owned_lecture(pool: &PgPool, user_id: Uuid, course_id: Uuid, lecture_id: Uuid) -> Result<Lecture> {
  let lecture = db::catalog::fetch_lecture(pool, lecture_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Lecture with ID {} not found.", lecture_id)))?;
  if lecture.course_id != course_id {
    return Err(AppError::NotFound(format!(
      "Lecture {} does not belong to course {}.",
      lecture_id, course_id
    )));
  }
  if !db::enrollments::is_enrolled(pool, user_id, course_id).await? {
    return Err(AppError::Auth(format!("User does not own course {}.", course_id)));
  }
  Ok(lecture)
}

/// Runs the course-completion rollup after a completing write. Returns the
/// enrollment row's current completion state.
async fn rollup_if_completed(pool: &PgPool, user_id: Uuid, course_id: Uuid, row_completed: bool) -> Result<bool> {
  if row_completed && db::enrollments::complete_course_if_all_lectures_done(pool, user_id, course_id).await? {
    info!("User {} completed course {}.", user_id, course_id);
    return Ok(true);
  }
  // The flip may have happened on an earlier or concurrent write; report the
  // authoritative row state either way.
  let enrollment = db::enrollments::fetch_enrollment(pool, user_id, course_id).await?;
  Ok(enrollment.map(|e| e.completed).unwrap_or(false))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lecture_completion_triggers_on_flag_or_full_progress() {
    assert!(lecture_completed(true, 0));
    assert!(lecture_completed(false, 100));
    assert!(lecture_completed(false, 150)); // clamped upstream, still complete
    assert!(!lecture_completed(false, 99));
  }

  #[test]
  fn quiz_completion_triggers_on_flag_or_passing_score() {
    assert!(quiz_completed(true, 0));
    assert!(quiz_completed(false, QUIZ_PASSING_SCORE));
    assert!(quiz_completed(false, 100));
    assert!(!quiz_completed(false, QUIZ_PASSING_SCORE - 1));
  }

  #[test]
  fn progress_is_clamped_to_percentage_range() {
    assert_eq!(clamp_progress(-5), 0);
    assert_eq!(clamp_progress(42), 42);
    assert_eq!(clamp_progress(250), 100);
  }
}
