// server/src/web/handlers/course_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::list_courses", skip(app_state))]
pub async fn list_courses_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let courses = db::catalog::list_courses(&app_state.db_pool).await?;
  info!("Fetched {} course(s).", courses.len());

  Ok(HttpResponse::Ok().json(json!({
    "courses": courses
  })))
}

#[instrument(name = "handler::get_course", skip(app_state, path), fields(course_id = %path.as_ref()))]
pub async fn get_course_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let course_id = path.into_inner();

  match db::catalog::fetch_course(&app_state.db_pool, course_id).await? {
    Some(course) => Ok(HttpResponse::Ok().json(json!({ "course": course }))),
    None => {
      warn!("Course with ID {} not found.", course_id);
      Err(AppError::NotFound(format!("Course with ID {} not found.", course_id)))
    }
  }
}

/// The entitlement surface: every course the caller owns, with completion
/// state. Ownership rows exist only through settlement.
#[instrument(name = "handler::list_my_courses", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_my_courses_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let owned = db::enrollments::list_owned_courses(&app_state.db_pool, auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(json!({
    "courses": owned
  })))
}
