// server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub app_base_url: String,

  /// ISO 4217 code every order is priced and settled in.
  pub currency: String,

  // Merchant account identifiers at the two payment processors
  pub stripe_merchant_account: String,
  pub paypal_merchant_account: String,

  pub receipt_sender: String,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|_| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL")?;
    let app_base_url = get_env("APP_BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", server_host, server_port));

    let currency = get_env("CURRENCY").unwrap_or_else(|_| "USD".to_string());

    let stripe_merchant_account =
      get_env("STRIPE_MERCHANT_ACCOUNT").unwrap_or_else(|_| "acct_stripe_sandbox".to_string());
    let paypal_merchant_account =
      get_env("PAYPAL_MERCHANT_ACCOUNT").unwrap_or_else(|_| "acct_paypal_sandbox".to_string());
    let receipt_sender = get_env("RECEIPT_SENDER").unwrap_or_else(|_| "receipts@coursebay.dev".to_string());

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      app_base_url,
      currency,
      stripe_merchant_account,
      paypal_merchant_account,
      receipt_sender,
    })
  }
}
