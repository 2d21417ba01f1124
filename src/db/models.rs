//! Database models and API response shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A transcribed video, as persisted and as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoDocument {
    pub id: Uuid,
    pub url: String,
    pub transcript: String,
    pub timestamp: DateTime<Utc>,
}

impl VideoDocument {
    pub fn new(url: String, transcript: String) -> Self {
        VideoDocument {
            id: Uuid::new_v4(),
            url,
            transcript,
            timestamp: Utc::now(),
        }
    }
}

/// Which AI pipeline produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Summary,
    Enrichment,
}

impl ResultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Summary => "summary",
            ResultKind::Enrichment => "enrichment",
        }
    }
}

/// Outcome of a summarize/enrich call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProcessOutcome {
    pub id: Uuid,
    pub result: String,
    pub timestamp: DateTime<Utc>,
}

impl ProcessOutcome {
    pub fn new(result: String) -> Self {
        ProcessOutcome {
            id: Uuid::new_v4(),
            result,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_documents_get_distinct_ids() {
        let a = VideoDocument::new("u".into(), "t".into());
        let b = VideoDocument::new("u".into(), "t".into());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn result_kind_tags() {
        assert_eq!(ResultKind::Summary.as_str(), "summary");
        assert_eq!(ResultKind::Enrichment.as_str(), "enrichment");
    }
}
