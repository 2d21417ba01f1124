//! Video and AI-result persistence

use super::models::{ProcessOutcome, ResultKind, VideoDocument};
use super::pool::{DbError, DbPool};
use tracing::debug;

/// Repository for transcribed videos and AI results.
#[derive(Clone)]
pub struct VideoRepository {
    pool: DbPool,
}

impl VideoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn insert_video(&self, video: &VideoDocument) -> Result<(), DbError> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO videos (id, url, transcript, created_at) VALUES ($1, $2, $3, $4)",
                &[&video.id, &video.url, &video.transcript, &video.timestamp],
            )
            .await?;
        debug!(video_id = %video.id, "video persisted");
        Ok(())
    }

    pub async fn insert_result(
        &self,
        kind: ResultKind,
        outcome: &ProcessOutcome,
    ) -> Result<(), DbError> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO ai_results (id, kind, result, created_at) VALUES ($1, $2, $3, $4)",
                &[
                    &outcome.id,
                    &kind.as_str(),
                    &outcome.result,
                    &outcome.timestamp,
                ],
            )
            .await?;
        debug!(result_id = %outcome.id, kind = kind.as_str(), "AI result persisted");
        Ok(())
    }

    /// Most recent videos, newest first.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<VideoDocument>, DbError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"
                SELECT id, url, transcript, created_at
                FROM videos
                ORDER BY created_at DESC
                LIMIT $1
                "#,
                &[&limit],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|r| VideoDocument {
                id: r.get("id"),
                url: r.get("url"),
                transcript: r.get("transcript"),
                timestamp: r.get("created_at"),
            })
            .collect())
    }
}
