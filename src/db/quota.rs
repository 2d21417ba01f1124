//! Database-backed quota store
//!
//! Implements the sliding-window call log on PostgreSQL. Purge, count and
//! insert run inside one transaction holding a per-client advisory lock, so
//! concurrent checks for the same client serialize and cannot both slip past
//! the limit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::pool::{DbError, DbPool};
use crate::quota::{Admission, QuotaStore, QuotaStoreError};

const CALL_KIND: &str = "ai_call";

/// `QuotaStore` over the `ai_call_log` table.
#[derive(Clone)]
pub struct PgQuotaStore {
    pool: DbPool,
}

impl PgQuotaStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn admit_tx(
        &self,
        client_id: &str,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Admission, DbError> {
        let mut conn = self.pool.get().await?;
        let tx = conn.transaction().await?;

        // Serialize concurrent checks for this client for the duration of
        // the transaction.
        tx.execute(
            "SELECT pg_advisory_xact_lock(hashtext($1))",
            &[&client_id],
        )
        .await?;

        tx.execute(
            "DELETE FROM ai_call_log WHERE client_id = $1 AND called_at < $2",
            &[&client_id, &cutoff],
        )
        .await?;

        let row = tx
            .query_one(
                "SELECT COUNT(*) FROM ai_call_log WHERE client_id = $1",
                &[&client_id],
            )
            .await?;
        let count: i64 = row.get(0);

        let admitted = count < limit;
        if admitted {
            tx.execute(
                "INSERT INTO ai_call_log (client_id, kind, called_at) VALUES ($1, $2, $3)",
                &[&client_id, &CALL_KIND, &now],
            )
            .await?;
        }

        tx.commit().await?;

        Ok(Admission {
            admitted,
            live_count: if admitted { count + 1 } else { count },
        })
    }
}

#[async_trait]
impl QuotaStore for PgQuotaStore {
    async fn try_admit(
        &self,
        client_id: &str,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Admission, QuotaStoreError> {
        self.admit_tx(client_id, cutoff, now, limit)
            .await
            .map_err(|e| QuotaStoreError(e.to_string()))
    }
}
