// server/src/web/extractors.rs

//! Request extractors shared across handlers.

use crate::errors::AppError;
use actix_web::{FromRequest, HttpRequest};
use tracing::warn;
use uuid::Uuid;

/// The authenticated caller, as supplied by the external identity/session
/// collaborator. This deployment's transport is a trusted `X-User-ID`
/// header set by the identity proxy in front of the app; swapping in a
/// session or JWT transport only touches this extractor.
#[derive(Debug)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    if let Some(user_id_header) = req.headers().get("X-User-ID") {
      if let Ok(user_id_str) = user_id_header.to_str() {
        if let Ok(user_id) = Uuid::parse_str(user_id_str) {
          return futures_util::future::ready(Ok(AuthenticatedUser { user_id }));
        }
      }
    }
    warn!("AuthenticatedUser extractor: missing or invalid X-User-ID header.");
    futures_util::future::ready(Err(AppError::Auth(
      "User authentication required. Missing or invalid identity header.".to_string(),
    )))
  }
}
