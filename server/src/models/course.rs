// server/src/models/course.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Course {
  pub id: Uuid,
  pub title: String,
  pub slug: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub thumbnail_url: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
