//! YouTube timedtext caption source
//!
//! Fetches caption tracks from YouTube's timedtext endpoint in the `json3`
//! format, optionally through a configured HTTP proxy.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{CaptionError, CaptionSource};

const TIMEDTEXT_URL: &str = "https://video.google.com/timedtext";

/// `json3` caption payload: a list of events, each holding text segments.
#[derive(Debug, Deserialize)]
struct TimedTextPayload {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
struct TimedTextEvent {
    #[serde(default)]
    segs: Vec<TimedTextSegment>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSegment {
    #[serde(default)]
    utf8: String,
}

/// Caption source backed by the timedtext endpoint.
pub struct TimedTextSource {
    client: Client,
}

impl TimedTextSource {
    /// Build the source, routing through `proxy_url` when given.
    pub fn new(proxy_url: Option<&str>) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("tubebrief/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy) = proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(TimedTextSource {
            client: builder.build()?,
        })
    }

    fn parse_fragments(body: &str) -> Result<Vec<String>, CaptionError> {
        let payload: TimedTextPayload =
            serde_json::from_str(body).map_err(|e| CaptionError::Parse(e.to_string()))?;

        Ok(payload
            .events
            .into_iter()
            .flat_map(|event| event.segs)
            .map(|seg| seg.utf8.trim().to_string())
            .filter(|text| !text.is_empty())
            .collect())
    }
}

#[async_trait]
impl CaptionSource for TimedTextSource {
    async fn fetch(&self, video_id: &str, lang: &str) -> Result<Vec<String>, CaptionError> {
        debug!(video_id = %video_id, lang = %lang, "fetching caption track");

        let response = self
            .client
            .get(TIMEDTEXT_URL)
            .query(&[("v", video_id), ("lang", lang), ("fmt", "json3")])
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;

        // The endpoint answers 200 with an empty body when the track does
        // not exist in the requested language.
        if body.trim().is_empty() {
            return Err(CaptionError::NoTrack {
                lang: lang.to_string(),
            });
        }

        Self::parse_fragments(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json3_events_in_order() {
        let body = r#"{
            "events": [
                {"segs": [{"utf8": "hello "}, {"utf8": "world"}]},
                {"segs": [{"utf8": "second cue"}]},
                {"segs": []}
            ]
        }"#;
        let fragments = TimedTextSource::parse_fragments(body).unwrap();
        assert_eq!(fragments, vec!["hello", "world", "second cue"]);
    }

    #[test]
    fn skips_whitespace_only_segments() {
        let body = r#"{"events": [{"segs": [{"utf8": "\n"}, {"utf8": "text"}]}]}"#;
        let fragments = TimedTextSource::parse_fragments(body).unwrap();
        assert_eq!(fragments, vec!["text"]);
    }

    #[test]
    fn malformed_payload_is_a_parse_error() {
        assert!(matches!(
            TimedTextSource::parse_fragments("<transcript/>"),
            Err(CaptionError::Parse(_))
        ));
    }

    #[test]
    fn missing_events_key_yields_no_fragments() {
        let fragments = TimedTextSource::parse_fragments("{}").unwrap();
        assert!(fragments.is_empty());
    }
}
