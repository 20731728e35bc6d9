// server/src/db/catalog.rs

//! Read-only course catalog lookups (pricing, display snapshots, lectures).
//! The catalog is a collaborator: nothing in this module writes.

use crate::errors::Result;
use crate::models::{Course, Lecture};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn list_courses(pool: &PgPool) -> Result<Vec<Course>> {
  let courses = sqlx::query_as::<_, Course>(
    "SELECT id, title, slug, description, price_cents, thumbnail_url, created_at, updated_at \
     FROM courses ORDER BY title ASC",
  )
  .fetch_all(pool)
  .await?;
  Ok(courses)
}

pub async fn fetch_course(pool: &PgPool, course_id: Uuid) -> Result<Option<Course>> {
  let course = sqlx::query_as::<_, Course>(
    "SELECT id, title, slug, description, price_cents, thumbnail_url, created_at, updated_at \
     FROM courses WHERE id = $1",
  )
  .bind(course_id)
  .fetch_optional(pool)
  .await?;
  Ok(course)
}

/// Fetches every course whose id is in `course_ids`. Missing ids are simply
/// absent from the result; callers decide whether that is an error.
pub async fn fetch_courses_by_ids(pool: &PgPool, course_ids: &[Uuid]) -> Result<Vec<Course>> {
  let courses = sqlx::query_as::<_, Course>(
    "SELECT id, title, slug, description, price_cents, thumbnail_url, created_at, updated_at \
     FROM courses WHERE id = ANY($1)",
  )
  .bind(course_ids)
  .fetch_all(pool)
  .await?;
  Ok(courses)
}

pub async fn fetch_lecture(pool: &PgPool, lecture_id: Uuid) -> Result<Option<Lecture>> {
  let lecture = sqlx::query_as::<_, Lecture>("SELECT id, course_id, title, position, kind FROM lectures WHERE id = $1")
    .bind(lecture_id)
    .fetch_optional(pool)
    .await?;
  Ok(lecture)
}
