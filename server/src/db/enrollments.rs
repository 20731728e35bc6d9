// server/src/db/enrollments.rs

//! UserCourse (ownership) persistence. Only the settlement path inserts here;
//! the progress rollup performs the one-way completion flip.

use crate::errors::Result;
use crate::models::{OwnedCourse, UserCourse};
use sqlx::PgPool;
use uuid::Uuid;

/// Grants ownership of every course in `course_ids` to the user.
/// Insert-skip-duplicates: re-running a settlement for already-owned courses
/// neither errors nor duplicates. Returns the number of rows actually
/// inserted.
pub async fn grant_courses(pool: &PgPool, user_id: Uuid, course_ids: &[Uuid]) -> Result<u64> {
  let inserted = sqlx::query(
    "INSERT INTO user_courses (user_id, course_id, purchased_at, completed) \
     SELECT $1, course_id, now(), FALSE FROM UNNEST($2::uuid[]) AS course_id \
     ON CONFLICT (user_id, course_id) DO NOTHING",
  )
  .bind(user_id)
  .bind(course_ids)
  .execute(pool)
  .await?
  .rows_affected();
  Ok(inserted)
}

pub async fn is_enrolled(pool: &PgPool, user_id: Uuid, course_id: Uuid) -> Result<bool> {
  let enrolled: bool =
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM user_courses WHERE user_id = $1 AND course_id = $2)")
      .bind(user_id)
      .bind(course_id)
      .fetch_one(pool)
      .await?;
  Ok(enrolled)
}

/// Of `candidate_ids`, returns the subset the user already owns.
pub async fn owned_course_ids(pool: &PgPool, user_id: Uuid, candidate_ids: &[Uuid]) -> Result<Vec<Uuid>> {
  let owned: Vec<Uuid> =
    sqlx::query_scalar("SELECT course_id FROM user_courses WHERE user_id = $1 AND course_id = ANY($2)")
      .bind(user_id)
      .bind(candidate_ids)
      .fetch_all(pool)
      .await?;
  Ok(owned)
}

pub async fn fetch_enrollment(pool: &PgPool, user_id: Uuid, course_id: Uuid) -> Result<Option<UserCourse>> {
  let enrollment = sqlx::query_as::<_, UserCourse>(
    "SELECT user_id, course_id, purchased_at, completed, completed_at \
     FROM user_courses WHERE user_id = $1 AND course_id = $2",
  )
  .bind(user_id)
  .bind(course_id)
  .fetch_optional(pool)
  .await?;
  Ok(enrollment)
}

pub async fn list_owned_courses(pool: &PgPool, user_id: Uuid) -> Result<Vec<OwnedCourse>> {
  let owned = sqlx::query_as::<_, OwnedCourse>(
    "SELECT uc.course_id, c.title, c.thumbnail_url, uc.purchased_at, uc.completed, uc.completed_at \
     FROM user_courses uc JOIN courses c ON c.id = uc.course_id \
     WHERE uc.user_id = $1 ORDER BY uc.purchased_at DESC",
  )
  .bind(user_id)
  .fetch_all(pool)
  .await?;
  Ok(owned)
}

/// One-way completion flip, recomputed from authoritative counts inside the
/// statement so concurrent lecture completions converge: the row flips
/// exactly when every lecture of the course has a completed progress row,
/// whichever update gets there last. Returns whether this call flipped it.
pub async fn complete_course_if_all_lectures_done(pool: &PgPool, user_id: Uuid, course_id: Uuid) -> Result<bool> {
  let flipped = sqlx::query(
    "UPDATE user_courses uc SET completed = TRUE, completed_at = now() \
     WHERE uc.user_id = $1 AND uc.course_id = $2 AND uc.completed = FALSE \
       AND (SELECT count(*) FROM lectures l WHERE l.course_id = $2) > 0 \
       AND (SELECT count(*) FROM lectures l WHERE l.course_id = $2) = ( \
         SELECT count(*) FROM ( \
           SELECT lecture_id FROM user_lecture_progress \
            WHERE user_id = $1 AND course_id = $2 AND completed = TRUE \
           UNION \
           SELECT lecture_id FROM user_quiz_progress \
            WHERE user_id = $1 AND course_id = $2 AND completed = TRUE \
         ) AS done \
       )",
  )
  .bind(user_id)
  .bind(course_id)
  .execute(pool)
  .await?
  .rows_affected();
  Ok(flipped == 1)
}
