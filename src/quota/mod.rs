//! Quota Guard
//!
//! Gates the AI endpoints (summarize/enrich) behind a sliding-window
//! per-client quota backed by a persistent call log, with a shared-secret
//! bypass for pro users.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Store-level failure. The guard treats any store error as a degradation
/// and fails open rather than blocking traffic.
#[derive(Debug, Error)]
#[error("quota store error: {0}")]
pub struct QuotaStoreError(pub String);

/// Outcome of an admission attempt against the backing store.
#[derive(Debug, Clone, Copy)]
pub struct Admission {
    /// Whether a new call record was written.
    pub admitted: bool,
    /// Live (non-expired) records for the client after the attempt,
    /// including the one just written when admitted.
    pub live_count: i64,
}

/// Backing store for call records.
///
/// `try_admit` must be atomic per client: purge records older than `cutoff`,
/// count the remainder, and insert a record at `now` only when the count is
/// below `limit`. Two concurrent calls for the same client must not both be
/// admitted past the limit.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    async fn try_admit(
        &self,
        client_id: &str,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Admission, QuotaStoreError>;
}

/// Guard decision for a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaDecision {
    /// Under the limit; a call record was written.
    Admitted { remaining: i64 },
    /// Valid bypass key presented; nothing counted, nothing written.
    Bypassed,
    /// Window allotment exhausted.
    Rejected { limit: i64, window_secs: u64 },
    /// Store unavailable; the call proceeds without enforcement.
    Unchecked,
}

impl QuotaDecision {
    /// Whether the gated operation may proceed.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, QuotaDecision::Rejected { .. })
    }
}

/// Quota policy, fixed at process start.
#[derive(Debug, Clone)]
pub struct QuotaPolicy {
    /// Maximum admitted calls per window.
    pub max_requests: i64,
    /// Trailing window length in seconds.
    pub window_secs: u64,
    /// Shared secret disabling enforcement for a call. Unset means the
    /// bypass path is permanently disabled.
    pub bypass_key: Option<String>,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        QuotaPolicy {
            max_requests: 5,
            window_secs: 3600,
            bypass_key: None,
        }
    }
}

/// Sliding-window quota guard over a [`QuotaStore`].
pub struct QuotaGuard {
    store: Arc<dyn QuotaStore>,
    policy: QuotaPolicy,
}

impl QuotaGuard {
    pub fn new(store: Arc<dyn QuotaStore>, policy: QuotaPolicy) -> Self {
        QuotaGuard { store, policy }
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    /// Decide whether a call from `client_id` may proceed, recording it when
    /// admitted.
    ///
    /// The bypass comparison short-circuits before any store access: a valid
    /// key is neither counted nor written. Store errors fail open.
    pub async fn check_and_record(
        &self,
        client_id: &str,
        presented_key: Option<&str>,
    ) -> QuotaDecision {
        if let (Some(expected), Some(presented)) =
            (self.policy.bypass_key.as_deref(), presented_key)
        {
            if !presented.is_empty() && presented == expected {
                debug!(client_id = %client_id, "valid pro key presented, bypassing quota");
                return QuotaDecision::Bypassed;
            }
        }

        let now = Utc::now();
        let cutoff = now - ChronoDuration::seconds(self.policy.window_secs as i64);

        match self
            .store
            .try_admit(client_id, cutoff, now, self.policy.max_requests)
            .await
        {
            Ok(admission) if admission.admitted => {
                let remaining = (self.policy.max_requests - admission.live_count).max(0);
                debug!(
                    client_id = %client_id,
                    used = admission.live_count,
                    remaining,
                    "AI call admitted"
                );
                QuotaDecision::Admitted { remaining }
            }
            Ok(admission) => {
                warn!(
                    client_id = %client_id,
                    current = admission.live_count,
                    limit = self.policy.max_requests,
                    "quota exceeded"
                );
                QuotaDecision::Rejected {
                    limit: self.policy.max_requests,
                    window_secs: self.policy.window_secs,
                }
            }
            Err(e) => {
                warn!(
                    client_id = %client_id,
                    error = %e,
                    "quota store unavailable, admitting without enforcement"
                );
                QuotaDecision::Unchecked
            }
        }
    }
}

/// In-memory store used when no database is configured.
///
/// The mutex is held across purge/count/insert, which serializes concurrent
/// checks for all clients. Fine at this scale.
#[derive(Default)]
pub struct MemoryQuotaStore {
    calls: Mutex<HashMap<String, Vec<DateTime<Utc>>>>,
}

impl MemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuotaStore for MemoryQuotaStore {
    async fn try_admit(
        &self,
        client_id: &str,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Admission, QuotaStoreError> {
        let mut calls = self.calls.lock();
        let entry = calls.entry(client_id.to_string()).or_default();
        entry.retain(|t| *t >= cutoff);

        let count = entry.len() as i64;
        let admitted = count < limit;
        if admitted {
            entry.push(now);
        }

        Ok(Admission {
            admitted,
            live_count: if admitted { count + 1 } else { count },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    #[async_trait]
    impl QuotaStore for FailingStore {
        async fn try_admit(
            &self,
            _client_id: &str,
            _cutoff: DateTime<Utc>,
            _now: DateTime<Utc>,
            _limit: i64,
        ) -> Result<Admission, QuotaStoreError> {
            Err(QuotaStoreError("connection refused".to_string()))
        }
    }

    fn guard(policy: QuotaPolicy) -> QuotaGuard {
        QuotaGuard::new(Arc::new(MemoryQuotaStore::new()), policy)
    }

    #[tokio::test]
    async fn admits_up_to_limit_then_rejects() {
        let guard = guard(QuotaPolicy::default());

        for n in 0..5 {
            let decision = guard.check_and_record("1.2.3.4", None).await;
            assert_eq!(
                decision,
                QuotaDecision::Admitted { remaining: 4 - n },
                "call {} should be admitted",
                n + 1
            );
        }

        let sixth = guard.check_and_record("1.2.3.4", None).await;
        assert_eq!(
            sixth,
            QuotaDecision::Rejected {
                limit: 5,
                window_secs: 3600
            }
        );
        assert!(!sixth.is_allowed());
    }

    #[tokio::test]
    async fn clients_are_counted_independently() {
        let guard = guard(QuotaPolicy {
            max_requests: 1,
            ..QuotaPolicy::default()
        });

        assert!(guard.check_and_record("10.0.0.1", None).await.is_allowed());
        assert!(!guard.check_and_record("10.0.0.1", None).await.is_allowed());
        assert!(guard.check_and_record("10.0.0.2", None).await.is_allowed());
    }

    #[tokio::test]
    async fn valid_bypass_key_always_admits_and_never_counts() {
        let guard = guard(QuotaPolicy {
            max_requests: 1,
            bypass_key: Some("pro-secret".to_string()),
            ..QuotaPolicy::default()
        });

        // Exhaust the single slot.
        assert!(guard.check_and_record("1.2.3.4", None).await.is_allowed());
        assert!(!guard.check_and_record("1.2.3.4", None).await.is_allowed());

        // Bypass still goes through, repeatedly.
        for _ in 0..3 {
            assert_eq!(
                guard.check_and_record("1.2.3.4", Some("pro-secret")).await,
                QuotaDecision::Bypassed
            );
        }

        // And those bypassed calls did not consume anything further:
        // the client is still exactly at its limit, not past it.
        assert_eq!(
            guard.check_and_record("1.2.3.4", None).await,
            QuotaDecision::Rejected {
                limit: 1,
                window_secs: 3600
            }
        );
    }

    #[tokio::test]
    async fn wrong_or_empty_key_does_not_bypass() {
        let guard = guard(QuotaPolicy {
            max_requests: 1,
            bypass_key: Some("pro-secret".to_string()),
            ..QuotaPolicy::default()
        });

        assert!(guard
            .check_and_record("1.2.3.4", Some("wrong"))
            .await
            .is_allowed());
        assert!(!guard
            .check_and_record("1.2.3.4", Some(""))
            .await
            .is_allowed());
    }

    #[tokio::test]
    async fn bypass_disabled_when_no_key_configured() {
        let guard = guard(QuotaPolicy {
            max_requests: 1,
            bypass_key: None,
            ..QuotaPolicy::default()
        });

        assert!(guard
            .check_and_record("1.2.3.4", Some("anything"))
            .await
            .is_allowed());
        let second = guard.check_and_record("1.2.3.4", Some("anything")).await;
        assert!(!second.is_allowed());
    }

    #[tokio::test]
    async fn expired_records_do_not_count() {
        let store = Arc::new(MemoryQuotaStore::new());
        let guard = QuotaGuard::new(
            store.clone(),
            QuotaPolicy {
                max_requests: 1,
                ..QuotaPolicy::default()
            },
        );

        assert!(guard.check_and_record("1.2.3.4", None).await.is_allowed());
        assert!(!guard.check_and_record("1.2.3.4", None).await.is_allowed());

        // Age the recorded call past the window.
        {
            let mut calls = store.calls.lock();
            for t in calls.get_mut("1.2.3.4").unwrap() {
                *t = *t - ChronoDuration::seconds(3601);
            }
        }

        assert_eq!(
            guard.check_and_record("1.2.3.4", None).await,
            QuotaDecision::Admitted { remaining: 0 }
        );
    }

    #[tokio::test]
    async fn fails_open_when_store_is_down() {
        let guard = QuotaGuard::new(Arc::new(FailingStore), QuotaPolicy::default());

        let decision = guard.check_and_record("1.2.3.4", None).await;
        assert_eq!(decision, QuotaDecision::Unchecked);
        assert!(decision.is_allowed());
    }

    #[tokio::test]
    async fn bypass_short_circuits_before_store_access() {
        // A failing store would return Unchecked; Bypassed proves the store
        // was never consulted.
        let guard = QuotaGuard::new(
            Arc::new(FailingStore),
            QuotaPolicy {
                bypass_key: Some("pro-secret".to_string()),
                ..QuotaPolicy::default()
            },
        );

        assert_eq!(
            guard.check_and_record("1.2.3.4", Some("pro-secret")).await,
            QuotaDecision::Bypassed
        );
    }
}
