// crates/server/src/routes/sessions.rs
//! Game session endpoints.
//!
//! - POST /api/sessions                 append one completed round
//! - GET  /api/sessions/{user_id}       newest rounds first

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use cogtrain_core::{Domain, GameSession, NewGameSession, ValidationError};
use cogtrain_db::MAX_RECENT_SESSIONS;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics::RequestTimer;
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: Option<String>,
    pub game_type: Option<String>,
    pub score: Option<i64>,
    pub game_name: Option<String>,
    pub accuracy: Option<f64>,
    pub reaction_time: Option<f64>,
    pub duration: Option<i64>,
    pub level: Option<i64>,
    pub metadata: Option<serde_json::Value>,
    pub played_at: Option<DateTime<Utc>>,
}

impl CreateSessionRequest {
    fn into_new_session(self) -> Result<NewGameSession, ValidationError> {
        let user_id = self.user_id.ok_or(ValidationError::MissingField("user_id"))?;
        let domain = self
            .game_type
            .ok_or(ValidationError::MissingField("game_type"))
            .and_then(|g| Domain::parse_str(&g))?;
        let score = self.score.ok_or(ValidationError::MissingField("score"))?;

        Ok(NewGameSession::new(user_id, domain, score)?
            .game_name(self.game_name)
            .accuracy(self.accuracy)?
            .reaction_time(self.reaction_time)?
            .duration(self.duration)?
            .level(self.level)?
            .metadata(self.metadata)?
            .played_at(self.played_at))
    }
}

#[derive(Debug, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
pub struct SessionResponse {
    pub success: bool,
    pub session: GameSession,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentSessionsQuery {
    pub game_type: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
pub struct SessionsResponse {
    pub success: bool,
    pub user_id: String,
    pub sessions: Vec<GameSession>,
}

/// POST /api/sessions
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    body: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let timer = RequestTimer::new("sessions_create");
    let result: ApiResult<(StatusCode, Json<SessionResponse>)> = async {
        let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let new = req.into_new_session()?;
        caller.ensure_owns(&new.user_id)?;

        let session = state.db.insert_game_session(&new).await?;
        Ok((
            StatusCode::CREATED,
            Json(SessionResponse {
                success: true,
                session,
            }),
        ))
    }
    .await;
    timer.finish(&result);
    result
}

/// GET /api/sessions/{user_id}?game_type=&limit=
pub async fn recent_sessions(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(user_id): Path<String>,
    query: Result<Query<RecentSessionsQuery>, QueryRejection>,
) -> ApiResult<Json<SessionsResponse>> {
    let timer = RequestTimer::new("sessions_recent");
    let result: ApiResult<Json<SessionsResponse>> = async {
        caller.ensure_owns(&user_id)?;
        let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let domain = query
            .game_type
            .as_deref()
            .filter(|g| !g.is_empty())
            .map(Domain::parse_str)
            .transpose()?;
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_RECENT_SESSIONS).contains(&limit) {
            return Err(ValidationError::out_of_range(
                "limit",
                format!("must be between 1 and {MAX_RECENT_SESSIONS}"),
            )
            .into());
        }

        let sessions = state.db.recent_sessions(&user_id, domain, limit).await?;
        Ok(Json(SessionsResponse {
            success: true,
            user_id,
            sessions,
        }))
    }
    .await;
    timer.finish(&result);
    result
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{user_id}", get(recent_sessions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(v: serde_json::Value) -> CreateSessionRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_required_fields() {
        let err = request(json!({"game_type": "processing-speed", "score": 1}))
            .into_new_session()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("user_id"));

        let err = request(json!({"user_id": "u1", "score": 1}))
            .into_new_session()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("game_type"));

        let err = request(json!({"user_id": "u1", "game_type": "processing-speed"}))
            .into_new_session()
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("score"));
    }

    #[test]
    fn test_unknown_game_type() {
        let err = request(json!({"user_id": "u1", "game_type": "chess", "score": 1}))
            .into_new_session()
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownDomain(_)));
    }

    #[test]
    fn test_optional_fields_carried() {
        let new = request(json!({
            "user_id": "u1",
            "game_type": "visual-tracking",
            "score": 42,
            "accuracy": 87.5,
            "duration": 60,
            "metadata": {"targets": 5}
        }))
        .into_new_session()
        .unwrap();
        assert_eq!(new.domain, Domain::VisualTracking);
        assert_eq!(new.accuracy, Some(87.5));
        assert_eq!(new.duration, Some(60));
        assert!(new.played_at.is_none());
    }

    #[test]
    fn test_out_of_range_accuracy_rejected() {
        let err = request(json!({
            "user_id": "u1",
            "game_type": "visual-tracking",
            "score": 1,
            "accuracy": 140.0
        }))
        .into_new_session()
        .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "accuracy", .. }));
    }
}
