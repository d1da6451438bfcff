//! Game session log: insert and windowed reads.

use chrono::Utc;
use cogtrain_core::{Domain, GameSession, NewGameSession, Period};
use uuid::Uuid;

use super::row_types::{timestamp, GameSessionRow};
use crate::{Database, DbResult};

const SESSION_COLUMNS: &str = "id, user_id, game_type, game_name, score, accuracy, \
     reaction_time, duration, level, metadata, played_at";

/// Upper bound for [`Database::recent_sessions`].
pub const MAX_RECENT_SESSIONS: i64 = 500;

impl Database {
    /// Append one session. `played_at` defaults to now and is stored at
    /// one-second resolution.
    pub async fn insert_game_session(&self, new: &NewGameSession) -> DbResult<GameSession> {
        let id = Uuid::new_v4().to_string();
        let played_at = new.played_at.unwrap_or_else(Utc::now).timestamp();
        let metadata = new
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        sqlx::query(
            "INSERT INTO game_sessions
                (id, user_id, game_type, game_name, score, accuracy,
                 reaction_time, duration, level, metadata, played_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&new.user_id)
        .bind(new.domain.as_str())
        .bind(&new.game_name)
        .bind(new.score)
        .bind(new.accuracy)
        .bind(new.reaction_time)
        .bind(new.duration)
        .bind(new.level)
        .bind(&metadata)
        .bind(played_at)
        .execute(self.pool())
        .await?;

        tracing::debug!(
            session_id = %id,
            user_id = %new.user_id,
            domain = %new.domain,
            score = new.score,
            "Game session stored"
        );

        Ok(GameSession {
            id,
            user_id: new.user_id.clone(),
            domain: new.domain,
            game_name: new.game_name.clone(),
            score: new.score,
            accuracy: new.accuracy,
            reaction_time: new.reaction_time,
            duration: new.duration,
            level: new.level,
            metadata: new.metadata.clone(),
            played_at: timestamp("played_at", played_at)?,
        })
    }

    /// Sessions for one user and domain whose `played_at` falls inside
    /// `period`, both boundary dates included.
    pub async fn sessions_in_window(
        &self,
        user_id: &str,
        domain: Domain,
        period: &Period,
    ) -> DbResult<Vec<GameSession>> {
        let (from, until) = period.unix_bounds();
        let rows: Vec<GameSessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM game_sessions
             WHERE user_id = ? AND game_type = ? AND played_at >= ? AND played_at < ?"
        ))
        .bind(user_id)
        .bind(domain.as_str())
        .bind(from)
        .bind(until)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    /// Newest sessions first, optionally narrowed to one domain. `limit` is
    /// clamped to `1..=MAX_RECENT_SESSIONS`.
    pub async fn recent_sessions(
        &self,
        user_id: &str,
        domain: Option<Domain>,
        limit: i64,
    ) -> DbResult<Vec<GameSession>> {
        let limit = limit.clamp(1, MAX_RECENT_SESSIONS);
        let rows: Vec<GameSessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM game_sessions
             WHERE user_id = ?1 AND (?2 IS NULL OR game_type = ?2)
             ORDER BY played_at DESC, id DESC
             LIMIT ?3"
        ))
        .bind(user_id)
        .bind(domain.map(Domain::as_str))
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}
