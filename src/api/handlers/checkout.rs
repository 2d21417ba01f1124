//! Checkout preference endpoint

use actix_web::{web, HttpResponse};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::AppState;

#[derive(Serialize, ToSchema)]
pub struct PreferenceResponse {
    /// Hosted checkout URL
    pub url: String,
}

/// POST /api/create-preference - Create a checkout preference for the pro key
#[utoipa::path(
    post,
    path = "/api/create-preference",
    tag = "payment",
    responses(
        (status = 200, description = "Checkout preference created", body = PreferenceResponse),
        (status = 500, description = "Payment gateway not configured or rejected the call", body = crate::error::ErrorBody)
    )
)]
pub async fn create_preference(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let checkout = state.checkout.as_ref().ok_or_else(|| {
        ApiError::Internal("Payment gateway not configured".to_string())
    })?;

    let url = checkout.create_preference().await.map_err(|e| {
        warn!(error = %e, "checkout preference creation failed");
        ApiError::Internal(format!("Could not create checkout preference: {}", e))
    })?;

    Ok(HttpResponse::Ok().json(PreferenceResponse { url }))
}
