// server/src/db/progress.rs

//! Progress persistence: upserts keyed (user_id, lecture_id) with monotonic
//! `completed` and non-decreasing progress/score enforced in the statement,
//! so concurrent and out-of-order deliveries converge to the same row.

use crate::errors::Result;
use crate::models::{UserLectureProgress, UserQuizProgress};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn upsert_lecture_progress(
  pool: &PgPool,
  user_id: Uuid,
  lecture_id: Uuid,
  course_id: Uuid,
  progress: i32,
  completed: bool,
) -> Result<UserLectureProgress> {
  let row = sqlx::query_as::<_, UserLectureProgress>(
    "INSERT INTO user_lecture_progress \
       (user_id, lecture_id, course_id, progress, completed, created_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, now(), now()) \
     ON CONFLICT (user_id, lecture_id) DO UPDATE \
     SET progress = GREATEST(user_lecture_progress.progress, EXCLUDED.progress), \
         completed = user_lecture_progress.completed OR EXCLUDED.completed, \
         updated_at = now() \
     RETURNING user_id, lecture_id, course_id, progress, completed, created_at, updated_at",
  )
  .bind(user_id)
  .bind(lecture_id)
  .bind(course_id)
  .bind(progress)
  .bind(completed)
  .fetch_one(pool)
  .await?;
  Ok(row)
}

pub async fn upsert_quiz_progress(
  pool: &PgPool,
  user_id: Uuid,
  lecture_id: Uuid,
  course_id: Uuid,
  score: i32,
  answers: &serde_json::Value,
  completed: bool,
) -> Result<UserQuizProgress> {
  let row = sqlx::query_as::<_, UserQuizProgress>(
    "INSERT INTO user_quiz_progress \
       (user_id, lecture_id, course_id, score, answers, completed, created_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, now(), now()) \
     ON CONFLICT (user_id, lecture_id) DO UPDATE \
     SET score = GREATEST(user_quiz_progress.score, EXCLUDED.score), \
         answers = EXCLUDED.answers, \
         completed = user_quiz_progress.completed OR EXCLUDED.completed, \
         updated_at = now() \
     RETURNING user_id, lecture_id, course_id, score, answers, completed, created_at, updated_at",
  )
  .bind(user_id)
  .bind(lecture_id)
  .bind(course_id)
  .bind(score)
  .bind(answers)
  .bind(completed)
  .fetch_one(pool)
  .await?;
  Ok(row)
}
