// crates/server/src/routes/records.rs
//! Generic per-user CRUD over the registry tables.
//!
//! - GET   /api/records/{table}
//! - POST  /api/records/{table}
//! - GET   /api/records/{table}/{id}
//! - PATCH /api/records/{table}/{id}
//!
//! Every row is scoped to the authenticated caller; `user_id` is never taken
//! from the request body.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use cogtrain_core::Table;
use cogtrain_db::{Record, MAX_RECORDS};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics::RequestTimer;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub success: bool,
    pub table: &'static str,
    pub records: Vec<Record>,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub success: bool,
    pub record: Record,
}

fn object_body(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Map<String, Value>> {
    let Json(value) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::BadRequest(
            "request body must be a JSON object".into(),
        )),
    }
}

fn record_response(record: Record) -> Json<RecordResponse> {
    Json(RecordResponse {
        success: true,
        record,
    })
}

/// GET /api/records/{table}?limit=
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(table): Path<String>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<RecordsResponse>> {
    let timer = RequestTimer::new("records_list");
    let result: ApiResult<Json<RecordsResponse>> = async {
        let table = Table::parse_str(&table)?;
        let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let limit = query.limit.unwrap_or(MAX_RECORDS);

        let records = state
            .db
            .list_records(table, &caller.user_id, limit)
            .await?;
        Ok(Json(RecordsResponse {
            success: true,
            table: table.name(),
            records,
        }))
    }
    .await;
    timer.finish(&result);
    result
}

/// GET /api/records/{table}/{id}
pub async fn get_record(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path((table, id)): Path<(String, String)>,
) -> ApiResult<Json<RecordResponse>> {
    let timer = RequestTimer::new("records_get");
    let result: ApiResult<Json<RecordResponse>> = async {
        let table = Table::parse_str(&table)?;
        let record = state
            .db
            .get_record(table, &caller.user_id, &id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("{table} {id}")))?;
        Ok(record_response(record))
    }
    .await;
    timer.finish(&result);
    result
}

/// POST /api/records/{table}
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(table): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RecordResponse>)> {
    let timer = RequestTimer::new("records_create");
    let result: ApiResult<(StatusCode, Json<RecordResponse>)> = async {
        let table = Table::parse_str(&table)?;
        let body = object_body(body)?;
        let values = table.validate_insert(&body)?;

        let record = state
            .db
            .insert_record(table, &caller.user_id, &values)
            .await?;
        tracing::info!(table = %table, user_id = %caller.user_id, "Record created");
        Ok((StatusCode::CREATED, record_response(record)))
    }
    .await;
    timer.finish(&result);
    result
}

/// PATCH /api/records/{table}/{id}
pub async fn update_record(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path((table, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<RecordResponse>> {
    let timer = RequestTimer::new("records_update");
    let result: ApiResult<Json<RecordResponse>> = async {
        let table = Table::parse_str(&table)?;
        let body = object_body(body)?;
        let values = table.validate_patch(&body)?;

        let record = state
            .db
            .update_record(table, &caller.user_id, &id, &values)
            .await?;
        Ok(record_response(record))
    }
    .await;
    timer.finish(&result);
    result
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/records/{table}", get(list_records).post(create_record))
        .route("/records/{table}/{id}", get(get_record).patch(update_record))
}
