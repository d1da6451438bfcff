//! Domain summary rows keyed by (user, domain, period_start, period_end).

use cogtrain_core::{DomainPerformance, SummaryKey};

use super::row_types::DomainPerformanceRow;
use crate::{Database, DbResult};

const SUMMARY_COLUMNS: &str = "user_id, domain, period_start, period_end, total_sessions, \
     average_score, median_score, best_score, score_stddev, average_accuracy, \
     total_playtime_seconds, last_played, last_updated";

impl Database {
    /// Exact-key lookup. `None` means never computed.
    pub async fn get_domain_performance(
        &self,
        key: &SummaryKey,
    ) -> DbResult<Option<DomainPerformance>> {
        let row: Option<DomainPerformanceRow> = sqlx::query_as(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM domain_performance
             WHERE user_id = ? AND domain = ? AND period_start = ? AND period_end = ?"
        ))
        .bind(&key.user_id)
        .bind(key.domain.as_str())
        .bind(key.period.start_str())
        .bind(key.period.end_str())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|r| r.0))
    }

    /// Insert or fully replace the row for `summary.key()` in one statement.
    /// Returns the row as stored.
    pub async fn upsert_domain_performance(
        &self,
        summary: &DomainPerformance,
    ) -> DbResult<DomainPerformance> {
        let row: DomainPerformanceRow = sqlx::query_as(&format!(
            "INSERT INTO domain_performance ({SUMMARY_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(user_id, domain, period_start, period_end) DO UPDATE SET
                total_sessions = excluded.total_sessions,
                average_score = excluded.average_score,
                median_score = excluded.median_score,
                best_score = excluded.best_score,
                score_stddev = excluded.score_stddev,
                average_accuracy = excluded.average_accuracy,
                total_playtime_seconds = excluded.total_playtime_seconds,
                last_played = excluded.last_played,
                last_updated = excluded.last_updated
             RETURNING {SUMMARY_COLUMNS}"
        ))
        .bind(&summary.user_id)
        .bind(summary.domain.as_str())
        .bind(summary.period.start_str())
        .bind(summary.period.end_str())
        .bind(summary.total_sessions)
        .bind(summary.average_score)
        .bind(summary.median_score)
        .bind(summary.best_score)
        .bind(summary.score_stddev)
        .bind(summary.average_accuracy)
        .bind(summary.total_playtime_seconds)
        .bind(summary.last_played.map(|t| t.timestamp()))
        .bind(summary.last_updated.timestamp())
        .fetch_one(self.pool())
        .await?;

        Ok(row.0)
    }
}
