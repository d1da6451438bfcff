// crates/core/src/aggregation.rs
//! Aggregation orchestrator: session store -> statistics engine -> summary
//! repository, once per domain.
//!
//! Each domain pipeline is independent. A failure in one domain is recorded
//! in that domain's [`DomainOutcome`] and never aborts the others. The
//! orchestrator holds no state between calls; concurrent invocations for the
//! same user are serialized per key by the repository's atomic upsert.

use std::collections::BTreeMap;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use ts_rs::TS;

use crate::error::StoreError;
use crate::period::Period;
use crate::stats;
use crate::types::{Domain, DomainPerformance, GameSession, SummaryKey};

/// Read side of the append-only session log.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Sessions for `user_id` in `domain` whose `played_at` falls inside
    /// `period` (both boundary dates inclusive). Order is unspecified.
    async fn sessions_in_window(
        &self,
        user_id: &str,
        domain: Domain,
        period: &Period,
    ) -> Result<Vec<GameSession>, StoreError>;
}

/// Storage for derived summaries, one row per [`SummaryKey`].
#[async_trait]
pub trait SummaryRepository: Send + Sync {
    async fn get_summary(&self, key: &SummaryKey)
        -> Result<Option<DomainPerformance>, StoreError>;

    /// Insert or fully replace the row for `summary.key()`. Must be atomic
    /// per key: on error any previous row is left untouched.
    async fn upsert_summary(
        &self,
        summary: &DomainPerformance,
    ) -> Result<DomainPerformance, StoreError>;
}

/// Result of one domain's pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainOutcome {
    /// At least one session in the window.
    Computed(DomainPerformance),
    /// Computed and persisted, but the window held no sessions.
    Empty(DomainPerformance),
    /// Reading sessions or writing the summary failed.
    Failed(String),
}

/// Wire label for a [`DomainOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Computed,
    Empty,
    Failed,
}

impl DomainOutcome {
    pub fn summary(&self) -> Option<&DomainPerformance> {
        match self {
            DomainOutcome::Computed(s) | DomainOutcome::Empty(s) => Some(s),
            DomainOutcome::Failed(_) => None,
        }
    }

    pub fn into_summary(self) -> Option<DomainPerformance> {
        match self {
            DomainOutcome::Computed(s) | DomainOutcome::Empty(s) => Some(s),
            DomainOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            DomainOutcome::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            DomainOutcome::Computed(_) => OutcomeKind::Computed,
            DomainOutcome::Empty(_) => OutcomeKind::Empty,
            DomainOutcome::Failed(_) => OutcomeKind::Failed,
        }
    }
}

/// Outcome of one `compute_for_user` call, keyed by every domain.
#[derive(Debug, Clone)]
pub struct AggregationReport {
    pub user_id: String,
    pub period: Period,
    pub outcomes: BTreeMap<Domain, DomainOutcome>,
}

impl AggregationReport {
    pub fn failed_domains(&self) -> impl Iterator<Item = Domain> + '_ {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, DomainOutcome::Failed(_)))
            .map(|(d, _)| *d)
    }

    pub fn all_failed(&self) -> bool {
        self.outcomes
            .values()
            .all(|o| matches!(o, DomainOutcome::Failed(_)))
    }
}

/// Drives the per-domain pipelines over a session store and a summary
/// repository.
pub struct Aggregator<'a, S: ?Sized, R: ?Sized> {
    sessions: &'a S,
    summaries: &'a R,
}

impl<'a, S, R> Aggregator<'a, S, R>
where
    S: SessionStore + ?Sized,
    R: SummaryRepository + ?Sized,
{
    pub fn new(sessions: &'a S, summaries: &'a R) -> Self {
        Self {
            sessions,
            summaries,
        }
    }

    /// Recompute and persist every domain's summary for `user_id` over
    /// `period`. `computed_at` becomes each row's `last_updated`.
    pub async fn compute_for_user(
        &self,
        user_id: &str,
        period: Period,
        computed_at: DateTime<Utc>,
    ) -> AggregationReport {
        let pipelines = Domain::ALL.into_iter().map(|domain| async move {
            let outcome = self
                .compute_domain(SummaryKey::new(user_id, domain, period), computed_at)
                .await;
            (domain, outcome)
        });
        let outcomes = join_all(pipelines).await.into_iter().collect();

        AggregationReport {
            user_id: user_id.to_string(),
            period,
            outcomes,
        }
    }

    /// One domain's pipeline: read, compute, upsert.
    pub async fn compute_domain(
        &self,
        key: SummaryKey,
        computed_at: DateTime<Utc>,
    ) -> DomainOutcome {
        let start = Instant::now();
        let user_id = key.user_id.clone();
        let domain = key.domain;
        let period = key.period;

        let sessions = match self
            .sessions
            .sessions_in_window(&user_id, domain, &period)
            .await
        {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    domain = %domain,
                    period_start = %period.start,
                    period_end = %period.end,
                    operation = "read_sessions",
                    error = %e,
                    "Domain aggregation failed"
                );
                return DomainOutcome::Failed(e.to_string());
            }
        };

        let summary = stats::compute(key, &sessions, computed_at);

        let stored = match self.summaries.upsert_summary(&summary).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    domain = %domain,
                    period_start = %period.start,
                    period_end = %period.end,
                    operation = "upsert_summary",
                    error = %e,
                    "Domain aggregation failed"
                );
                return DomainOutcome::Failed(e.to_string());
            }
        };

        tracing::debug!(
            user_id = %user_id,
            domain = %domain,
            sessions = stored.total_sessions,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Domain summary computed"
        );

        if stored.total_sessions == 0 {
            DomainOutcome::Empty(stored)
        } else {
            DomainOutcome::Computed(stored)
        }
    }

    /// Stored summaries for the exact `(user, domain, period)` keys; no
    /// computation and no fallback to other windows.
    pub async fn cached_for_user(
        &self,
        user_id: &str,
        period: Period,
    ) -> Result<BTreeMap<Domain, Option<DomainPerformance>>, StoreError> {
        let mut out = BTreeMap::new();
        for domain in Domain::ALL {
            let key = SummaryKey::new(user_id, domain, period);
            out.insert(domain, self.summaries.get_summary(&key).await?);
        }
        Ok(out)
    }
}
