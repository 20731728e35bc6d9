// server/src/web/handlers/progress_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::progress;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

// --- Request DTOs ---

#[derive(Deserialize, Debug)]
pub struct LectureProgressPayload {
  pub course_id: Uuid,
  pub lecture_id: Uuid,
  /// 0-100 share of the video watched.
  pub progress: i32,
  #[serde(default)]
  pub completed: bool,
}

#[derive(Deserialize, Debug)]
pub struct QuizProgressPayload {
  pub course_id: Uuid,
  pub lecture_id: Uuid,
  pub score: i32,
  #[serde(default)]
  pub answers: serde_json::Value,
  #[serde(default)]
  pub completed: bool,
}

// --- Handler implementations ---

#[instrument(
  name = "handler::record_lecture_progress",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id, lecture_id = %payload.lecture_id, progress = payload.progress)
)]
pub async fn record_lecture_progress_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<LectureProgressPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let outcome = progress::record_lecture_progress(
    &app_state.db_pool,
    auth_user.user_id,
    payload.course_id,
    payload.lecture_id,
    payload.progress,
    payload.completed,
  )
  .await?;

  Ok(HttpResponse::Ok().json(json!({
    "progress": outcome.progress,
    "courseCompleted": outcome.course_completed,
  })))
}

#[instrument(
  name = "handler::record_quiz_progress",
  skip(app_state, payload, auth_user),
  fields(user_id = %auth_user.user_id, lecture_id = %payload.lecture_id, score = payload.score)
)]
pub async fn record_quiz_progress_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<QuizProgressPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let outcome = progress::record_quiz_progress(
    &app_state.db_pool,
    auth_user.user_id,
    payload.course_id,
    payload.lecture_id,
    payload.score,
    payload.answers,
    payload.completed,
  )
  .await?;

  Ok(HttpResponse::Ok().json(json!({
    "progress": outcome.progress,
    "courseCompleted": outcome.course_completed,
  })))
}
