// crates/db/src/queries/row_types.rs
// Internal row types decoding SQLite columns into core types.

use chrono::{DateTime, NaiveDate, Utc};
use cogtrain_core::{Domain, DomainPerformance, GameSession, Period, DATE_FORMAT};
use sqlx::Row;

fn decode_err(column: &str, msg: impl std::fmt::Display) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: msg.to_string().into(),
    }
}

pub(crate) fn timestamp(column: &str, secs: i64) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| decode_err(column, format!("timestamp {secs} out of range")))
}

fn domain(column: &str, raw: &str) -> Result<Domain, sqlx::Error> {
    Domain::parse_str(raw).map_err(|e| decode_err(column, e))
}

fn date(column: &str, raw: &str) -> Result<NaiveDate, sqlx::Error> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| decode_err(column, e))
}

pub(crate) struct GameSessionRow(pub GameSession);

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for GameSessionRow {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        let game_type: String = row.try_get("game_type")?;
        let metadata: Option<String> = row.try_get("metadata")?;
        let metadata = metadata
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
            .map_err(|e| decode_err("metadata", e))?;

        Ok(Self(GameSession {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            domain: domain("game_type", &game_type)?,
            game_name: row.try_get("game_name")?,
            score: row.try_get("score")?,
            accuracy: row.try_get("accuracy")?,
            reaction_time: row.try_get("reaction_time")?,
            duration: row.try_get("duration")?,
            level: row.try_get("level")?,
            metadata,
            played_at: timestamp("played_at", row.try_get("played_at")?)?,
        }))
    }
}

pub(crate) struct DomainPerformanceRow(pub DomainPerformance);

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for DomainPerformanceRow {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        let raw_domain: String = row.try_get("domain")?;
        let start: String = row.try_get("period_start")?;
        let end: String = row.try_get("period_end")?;
        let last_played: Option<i64> = row.try_get("last_played")?;

        Ok(Self(DomainPerformance {
            user_id: row.try_get("user_id")?,
            domain: domain("domain", &raw_domain)?,
            period: Period {
                start: date("period_start", &start)?,
                end: date("period_end", &end)?,
            },
            total_sessions: row.try_get("total_sessions")?,
            average_score: row.try_get("average_score")?,
            median_score: row.try_get("median_score")?,
            best_score: row.try_get("best_score")?,
            score_stddev: row.try_get("score_stddev")?,
            average_accuracy: row.try_get("average_accuracy")?,
            total_playtime_seconds: row.try_get("total_playtime_seconds")?,
            last_played: last_played
                .map(|secs| timestamp("last_played", secs))
                .transpose()?,
            last_updated: timestamp("last_updated", row.try_get("last_updated")?)?,
        }))
    }
}
