// server/src/web/routes.rs

use actix_web::web;

// Simple liveness probe; deliberately does not touch the database.
async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Called in `main.rs` to configure services for the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      // Health check
      .route("/health", web::get().to(health_check_handler))
      // Catalog (read-only collaborator surface)
      .service(
        web::scope("/courses")
          .route("", web::get().to(crate::web::handlers::course_handlers::list_courses_handler))
          .route(
            "/{course_id}",
            web::get().to(crate::web::handlers::course_handlers::get_course_handler),
          ),
      )
      // Orders and payments
      .service(
        web::scope("/orders")
          .route("", web::post().to(crate::web::handlers::order_handlers::create_order_handler))
          .route(
            "/{order_id}",
            web::get().to(crate::web::handlers::order_handlers::get_order_handler),
          )
          .route(
            "/{order_id}/payments",
            web::post().to(crate::web::handlers::payment_handlers::initiate_payment_handler),
          )
          .route(
            "/{order_id}/payments/confirm",
            web::post().to(crate::web::handlers::payment_handlers::confirm_payment_handler),
          ),
      )
      // Asynchronous provider confirmations
      .service(web::scope("/payments").route(
        "/{provider}/webhook",
        web::post().to(crate::web::handlers::webhook_handlers::provider_webhook_handler),
      ))
      // Learning progress
      .service(
        web::scope("/progress")
          .route(
            "/lectures",
            web::post().to(crate::web::handlers::progress_handlers::record_lecture_progress_handler),
          )
          .route(
            "/quizzes",
            web::post().to(crate::web::handlers::progress_handlers::record_quiz_progress_handler),
          ),
      )
      // The caller's library (ownership proof)
      .service(web::scope("/me").route(
        "/courses",
        web::get().to(crate::web::handlers::course_handlers::list_my_courses_handler),
      )),
  );
}
