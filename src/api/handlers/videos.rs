//! Video processing endpoints
//!
//! Transcription is open; summarize/enrich are gated by the quota guard.
//! Persistence on the write paths is best-effort: a down store logs a
//! warning and the response still goes out.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::ai::Task;
use crate::api::identity::{extract_client_ip, extract_pro_key};
use crate::db::models::{ProcessOutcome, ResultKind, VideoDocument};
use crate::error::ApiError;
use crate::quota::QuotaDecision;
use crate::transcript::{extract_video_id, TranscriptError};
use crate::AppState;

/// Request body for transcription
#[derive(Debug, Deserialize, ToSchema)]
pub struct VideoRequest {
    /// YouTube video URL
    pub url: String,
}

/// Request body for summarize/enrich
#[derive(Debug, Deserialize, ToSchema)]
pub struct TextRequest {
    /// Transcript or arbitrary text to process
    pub text: String,
}

/// POST /api/videos/transcribe - Retrieve a video transcript
#[utoipa::path(
    post,
    path = "/api/videos/transcribe",
    tag = "videos",
    request_body = VideoRequest,
    responses(
        (status = 200, description = "Transcript retrieved", body = VideoDocument),
        (status = 400, description = "Invalid URL or no captions available", body = crate::error::ErrorBody)
    )
)]
pub async fn transcribe_video(
    state: web::Data<AppState>,
    body: web::Json<VideoRequest>,
) -> Result<HttpResponse, ApiError> {
    let video_id = extract_video_id(&body.url).map_err(|_| {
        ApiError::InvalidInput("Invalid YouTube URL".to_string())
    })?;

    info!(video_id = %video_id, "processing transcription request");

    let transcript = state
        .transcripts
        .get_transcript(video_id)
        .await
        .map_err(|e| match e {
            TranscriptError::InvalidUrl => ApiError::InvalidInput("Invalid YouTube URL".into()),
            TranscriptError::Unavailable(cause) => ApiError::TranscriptUnavailable(cause),
        })?;

    let document = VideoDocument::new(body.url.clone(), transcript);

    if let Some(repo) = &state.videos {
        if let Err(e) = repo.insert_video(&document).await {
            warn!(error = %e, video_id = %document.id, "failed to persist video, continuing");
        }
    } else {
        warn!("database unavailable, skipping video save");
    }

    Ok(HttpResponse::Ok().json(document))
}

/// POST /api/videos/summarize - Summarize text (quota-gated)
#[utoipa::path(
    post,
    path = "/api/videos/summarize",
    tag = "videos",
    request_body = TextRequest,
    responses(
        (status = 200, description = "Summary generated", body = ProcessOutcome),
        (status = 400, description = "Empty text", body = crate::error::ErrorBody),
        (status = 429, description = "Quota exceeded", body = crate::error::ErrorBody),
        (status = 502, description = "AI provider unavailable", body = crate::error::ErrorBody)
    )
)]
pub async fn summarize_text(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<TextRequest>,
) -> Result<HttpResponse, ApiError> {
    process_text(&req, &state, &body.text, Task::Summarize).await
}

/// POST /api/videos/enrich - Enrich text (quota-gated)
#[utoipa::path(
    post,
    path = "/api/videos/enrich",
    tag = "videos",
    request_body = TextRequest,
    responses(
        (status = 200, description = "Enriched version generated", body = ProcessOutcome),
        (status = 400, description = "Empty text", body = crate::error::ErrorBody),
        (status = 429, description = "Quota exceeded", body = crate::error::ErrorBody),
        (status = 502, description = "AI provider unavailable", body = crate::error::ErrorBody)
    )
)]
pub async fn enrich_text(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<TextRequest>,
) -> Result<HttpResponse, ApiError> {
    process_text(&req, &state, &body.text, Task::Enrich).await
}

/// Shared summarize/enrich pipeline: validate, gate, generate, persist.
async fn process_text(
    req: &HttpRequest,
    state: &AppState,
    text: &str,
    task: Task,
) -> Result<HttpResponse, ApiError> {
    validate_text(text)?;

    // An identity-less caller is unthrottled by design.
    if let Some(ip) = extract_client_ip(req) {
        let presented = extract_pro_key(req);
        let decision = state
            .quota
            .check_and_record(&ip.to_string(), presented.as_deref())
            .await;

        if let QuotaDecision::Rejected { limit, window_secs } = decision {
            return Err(ApiError::QuotaExceeded { limit, window_secs });
        }
    } else {
        warn!("could not resolve client identity, skipping quota check");
    }

    let result = state
        .models
        .generate_text(text, task)
        .await
        .map_err(|e| ApiError::ProviderUnavailable(e.to_string()))?;

    let outcome = ProcessOutcome::new(result);
    let kind = match task {
        Task::Summarize => ResultKind::Summary,
        Task::Enrich => ResultKind::Enrichment,
    };

    if let Some(repo) = &state.videos {
        if let Err(e) = repo.insert_result(kind, &outcome).await {
            warn!(error = %e, result_id = %outcome.id, "failed to persist AI result, continuing");
        }
    }

    Ok(HttpResponse::Ok().json(outcome))
}

/// Reject empty or whitespace-only text before any external call.
fn validate_text(text: &str) -> Result<(), ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::InvalidInput(
            "Text must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/videos - List recent videos
#[utoipa::path(
    get,
    path = "/api/videos",
    tag = "videos",
    responses(
        (status = 200, description = "Most recent videos", body = [VideoDocument]),
        (status = 500, description = "Database unavailable", body = crate::error::ErrorBody)
    )
)]
pub async fn list_videos(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let repo = state.videos.as_ref().ok_or(ApiError::StoreUnavailable)?;

    let videos = repo.list_recent(100).await.map_err(|e| {
        warn!(error = %e, "failed to list videos");
        ApiError::StoreUnavailable
    })?;

    Ok(HttpResponse::Ok().json(videos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        assert!(matches!(
            validate_text(""),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_text("   \n\t "),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn non_blank_text_passes() {
        assert!(validate_text("some transcript").is_ok());
    }
}
