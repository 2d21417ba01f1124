//! OpenAPI 3.0 specification definition

use utoipa::OpenApi;

use crate::api::handlers::{
    checkout::PreferenceResponse,
    health::HealthResponse,
    videos::{TextRequest, VideoRequest},
};
use crate::db::models::{ProcessOutcome, VideoDocument};
use crate::error::ErrorBody;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "TubeBrief API",
        version = "1.0.0",
        description = "YouTube transcript summarization and enrichment service",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "system", description = "Liveness endpoints"),
        (name = "videos", description = "Transcription and AI processing endpoints"),
        (name = "payment", description = "Checkout endpoints")
    ),
    paths(
        crate::api::handlers::health::health_check,
        crate::api::handlers::videos::transcribe_video,
        crate::api::handlers::videos::summarize_text,
        crate::api::handlers::videos::enrich_text,
        crate::api::handlers::videos::list_videos,
        crate::api::handlers::checkout::create_preference,
    ),
    components(
        schemas(
            HealthResponse,
            VideoRequest,
            TextRequest,
            VideoDocument,
            ProcessOutcome,
            PreferenceResponse,
            ErrorBody,
        )
    )
)]
pub struct ApiDoc;
