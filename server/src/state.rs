// server/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub flywheel: Arc<flywheel::Flywheel<AppError>>,
  pub config: Arc<AppConfig>, // Share loaded config
}
