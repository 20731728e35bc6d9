// server/src/models/lecture.rs

use serde::Serialize;
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

/// Matches `lecture_kind_enum` in schema.sql.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SqlxType)]
#[sqlx(type_name = "lecture_kind_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LectureKind {
  Video,
  Quiz,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Lecture {
  pub id: Uuid,
  pub course_id: Uuid,
  pub title: String,
  pub position: i32,
  pub kind: LectureKind,
}
