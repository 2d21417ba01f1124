//! Transcript retrieval
//!
//! Pure video-ID extraction from the recognized YouTube URL shapes, plus a
//! language-fallback fetcher over a pluggable caption source.

pub mod youtube;

pub use youtube::TimedTextSource;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Transcript-level failures surfaced to handlers.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("Invalid YouTube URL")]
    InvalidUrl,

    /// No caption track in any attempted language; carries the last
    /// underlying cause for diagnostics.
    #[error("no transcript available: {0}")]
    Unavailable(String),
}

/// Per-attempt failure from a caption source.
#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no captions for language {lang}")]
    NoTrack { lang: String },

    #[error("malformed caption payload: {0}")]
    Parse(String),
}

/// Ordered URL shapes the extractor recognizes. First match wins.
const URL_MARKERS: [&str; 4] = [
    "youtube.com/watch?v=",
    "youtu.be/",
    "youtube.com/embed/",
    "youtube.com/v/",
];

/// Extract the video ID from a YouTube URL.
///
/// The ID runs from the end of the matched marker to the next `&`, newline,
/// `?` or `#`. No validation beyond the match itself: a syntactically valid
/// but nonexistent ID only fails later at the caption fetch.
pub fn extract_video_id(url: &str) -> Result<&str, TranscriptError> {
    for marker in URL_MARKERS {
        if let Some(pos) = url.find(marker) {
            let rest = &url[pos + marker.len()..];
            let end = rest
                .find(|c| matches!(c, '&' | '\n' | '?' | '#'))
                .unwrap_or(rest.len());
            let id = &rest[..end];
            if !id.is_empty() {
                return Ok(id);
            }
        }
    }
    Err(TranscriptError::InvalidUrl)
}

/// Source of caption fragments for one video in one language.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    async fn fetch(&self, video_id: &str, lang: &str) -> Result<Vec<String>, CaptionError>;
}

/// Fetches transcripts with an ordered language-fallback chain.
pub struct TranscriptFetcher {
    source: Arc<dyn CaptionSource>,
    languages: Vec<String>,
    default_language: String,
}

impl TranscriptFetcher {
    pub fn new(
        source: Arc<dyn CaptionSource>,
        languages: Vec<String>,
        default_language: String,
    ) -> Self {
        TranscriptFetcher {
            source,
            languages,
            default_language,
        }
    }

    /// Retrieve a transcript, trying each preferred language in order and
    /// then the default language as a last resort.
    ///
    /// Fragments are joined in their original order with single spaces; no
    /// deduplication, no timestamps.
    pub async fn get_transcript(&self, video_id: &str) -> Result<String, TranscriptError> {
        let mut last_error = String::from("no languages configured");

        for lang in &self.languages {
            match self.source.fetch(video_id, lang).await {
                Ok(fragments) if !fragments.is_empty() => {
                    info!(video_id = %video_id, lang = %lang, "transcript retrieved");
                    return Ok(fragments.join(" "));
                }
                Ok(_) => {
                    debug!(video_id = %video_id, lang = %lang, "empty caption track, trying next");
                    last_error = format!("empty caption track for {}", lang);
                }
                Err(e) => {
                    debug!(video_id = %video_id, lang = %lang, error = %e, "caption fetch failed, trying next");
                    last_error = e.to_string();
                }
            }
        }

        // Last resort: the default language, even if it already appeared in
        // the preference list.
        match self.source.fetch(video_id, &self.default_language).await {
            Ok(fragments) if !fragments.is_empty() => {
                info!(video_id = %video_id, lang = %self.default_language, "transcript retrieved on default language");
                Ok(fragments.join(" "))
            }
            Ok(_) => Err(TranscriptError::Unavailable(last_error)),
            Err(e) => Err(TranscriptError::Unavailable(e.to_string())),
        }
    }
}
