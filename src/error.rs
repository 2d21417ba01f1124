//! API error taxonomy
//!
//! Every handler failure maps onto one of these variants, which render as the
//! JSON error body used across the API. Store failures on the write path are
//! deliberately absent: persistence degrades to a warning, it never fails the
//! request.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// JSON error body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed URL or empty text. Never retried.
    #[error("{0}")]
    InvalidInput(String),

    /// Window allotment exhausted and no valid pro key presented.
    #[error("Rate limit exceeded. Maximum {limit} AI requests per {window_secs} seconds. Try again later or provide a pro key.")]
    QuotaExceeded { limit: i64, window_secs: u64 },

    /// No caption track could be retrieved in any attempted language.
    #[error("Could not retrieve transcript: {0}")]
    TranscriptUnavailable(String),

    /// The AI backend rejected the call or was unreachable.
    #[error("AI provider error: {0}. Check the configured API key and quota.")]
    ProviderUnavailable(String),

    /// Persistence layer unreachable on a read path that requires it.
    #[error("Database connection unavailable")]
    StoreUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::QuotaExceeded { .. } => "rate_limit_exceeded",
            ApiError::TranscriptUnavailable(_) => "transcript_unavailable",
            ApiError::ProviderUnavailable(_) => "provider_unavailable",
            ApiError::StoreUnavailable => "store_unavailable",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) | ApiError::TranscriptUnavailable(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::StoreUnavailable | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.code(),
            message: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            ApiError::InvalidInput("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::QuotaExceeded {
                limit: 5,
                window_secs: 3600
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::TranscriptUnavailable("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::ProviderUnavailable("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::StoreUnavailable.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn quota_message_names_limit_and_window() {
        let msg = ApiError::QuotaExceeded {
            limit: 5,
            window_secs: 3600,
        }
        .to_string();
        assert!(msg.contains('5'));
        assert!(msg.contains("3600 seconds"));
    }
}
