// server/src/main.rs

// Declare modules for the application
mod config;
mod db;
mod errors;
mod models;
mod services;
mod state;
mod web;
mod workflows;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // Initialize tracing subscriber for logging
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO) // Default level
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .init();

  tracing::info!("Starting coursebay server...");

  // Load application configuration
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      panic!("Configuration error: {}", e);
    }
  };

  // Initialize database pool
  let db_pool = match PgPool::connect(&app_config.database_url).await {
    Ok(pool) => {
      tracing::info!("Successfully connected to the database.");
      pool
    }
    Err(e) => {
      tracing::error!(error = %e, "Failed to connect to the database.");
      panic!("Database connection error: {}", e);
    }
  };

  // Initialize the workflow registry.
  // Flywheel<AppError> so Flywheel::run returns our AppError.
  let flywheel = Arc::new(flywheel::Flywheel::<AppError>::new());

  // Create AppState
  let app_state = AppState {
    db_pool: db_pool.clone(),
    flywheel: flywheel.clone(),
    config: app_config.clone(),
  };

  // Register all workflows
  workflows::register_all_workflows(&flywheel, &app_state);

  // Configure and start the Actix web server
  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone())) // Share AppState with handlers
      .wrap(tracing_actix_web::TracingLogger::default()) // Request tracing middleware
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
