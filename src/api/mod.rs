//! API module - HTTP routes and handlers

pub mod handlers;
pub mod identity;
pub mod openapi;

use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::openapi::ApiDoc;

/// Configure all API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/", web::get().to(handlers::health::health_check))
            .service(
                web::scope("/videos")
                    .route("/transcribe", web::post().to(handlers::videos::transcribe_video))
                    .route("/summarize", web::post().to(handlers::videos::summarize_text))
                    .route("/enrich", web::post().to(handlers::videos::enrich_text))
                    .route("", web::get().to(handlers::videos::list_videos)),
            )
            .route(
                "/create-preference",
                web::post().to(handlers::checkout::create_preference),
            ),
    )
    // Swagger UI and OpenAPI spec
    .service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
