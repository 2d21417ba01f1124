//! Liveness endpoint

use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub message: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    /// Free AI calls per quota window
    pub free_quota: i64,
}

/// GET /api/ - Liveness check
#[utoipa::path(
    get,
    path = "/api/",
    tag = "system",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database = if state.videos.is_some() {
        "connected"
    } else {
        "unavailable"
    };

    HttpResponse::Ok().json(HealthResponse {
        message: "TubeBrief Video AI Processor API",
        version: env!("CARGO_PKG_VERSION"),
        database,
        free_quota: state.settings.quota.max_requests,
    })
}
