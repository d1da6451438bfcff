// crates/server/src/routes/analysis.rs
//! Domain performance endpoints.
//!
//! - GET  /api/analysis/domains/{user_id}  stored summaries for one exact window
//! - POST /api/analysis/compute-user       recompute and persist every domain

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use cogtrain_core::{
    AggregationReport, Aggregator, Domain, DomainOutcome, DomainPerformance, OutcomeKind, Period,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics::{record_aggregation, RequestTimer};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub period_start: Option<String>,
    pub period_end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ComputeRequest {
    pub user_id: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
}

/// Per-domain summaries for one window. `null` means no stored row.
#[derive(Debug, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
pub struct DomainsResponse {
    pub success: bool,
    pub user_id: String,
    #[serde(flatten)]
    pub period: Period,
    pub domains: BTreeMap<Domain, Option<DomainPerformance>>,
}

/// Result of a recompute. `domains` has the same shape as the read
/// endpoint; `outcomes` tells an empty window apart from a failed domain.
#[derive(Debug, Serialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
pub struct ComputeResponse {
    pub success: bool,
    pub user_id: String,
    #[serde(flatten)]
    pub period: Period,
    pub domains: BTreeMap<Domain, Option<DomainPerformance>>,
    pub outcomes: BTreeMap<Domain, OutcomeKind>,
    /// Failure message per failed domain.
    pub errors: BTreeMap<Domain, String>,
}

impl From<AggregationReport> for ComputeResponse {
    fn from(report: AggregationReport) -> Self {
        let mut domains = BTreeMap::new();
        let mut outcomes = BTreeMap::new();
        let mut errors = BTreeMap::new();
        for (domain, outcome) in report.outcomes {
            outcomes.insert(domain, outcome.kind());
            match outcome {
                DomainOutcome::Computed(s) | DomainOutcome::Empty(s) => {
                    domains.insert(domain, Some(s));
                }
                DomainOutcome::Failed(msg) => {
                    domains.insert(domain, None);
                    errors.insert(domain, msg);
                }
            }
        }
        Self {
            success: true,
            user_id: report.user_id,
            period: report.period,
            domains,
            outcomes,
            errors,
        }
    }
}

fn today() -> chrono::NaiveDate {
    Utc::now().date_naive()
}

/// GET /api/analysis/domains/{user_id}?period_start=&period_end=
///
/// Exact-key reads only; never computes.
pub async fn get_domains(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(user_id): Path<String>,
    query: Result<Query<PeriodQuery>, QueryRejection>,
) -> ApiResult<Json<DomainsResponse>> {
    let timer = RequestTimer::new("analysis_domains");
    let result: ApiResult<Json<DomainsResponse>> = async {
        caller.ensure_owns(&user_id)?;
        let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let period = Period::resolve_str(
            query.period_start.as_deref(),
            query.period_end.as_deref(),
            today(),
        )?;

        let domains = Aggregator::new(&*state.sessions, &*state.summaries)
            .cached_for_user(&user_id, period)
            .await
            .map_err(|e| {
                tracing::error!(
                    user_id = %user_id,
                    operation = "read_summaries",
                    error = %e,
                    "Failed to read domain summaries"
                );
                ApiError::Internal(e.to_string())
            })?;

        Ok(Json(DomainsResponse {
            success: true,
            user_id,
            period,
            domains,
        }))
    }
    .await;
    timer.finish(&result);
    result
}

/// POST /api/analysis/compute-user
///
/// Body: `{ user_id, period_start?, period_end? }`. Per-domain failures are
/// reported in the body; the request itself still succeeds.
pub async fn compute_user(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    body: Result<Json<ComputeRequest>, JsonRejection>,
) -> ApiResult<Json<ComputeResponse>> {
    let timer = RequestTimer::new("analysis_compute_user");
    let result: ApiResult<Json<ComputeResponse>> = async {
        let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let user_id = req
            .user_id
            .filter(|u| !u.trim().is_empty())
            .ok_or(ValidationError::MissingField("user_id"))?;
        caller.ensure_owns(&user_id)?;
        let period = Period::resolve_str(
            req.period_start.as_deref(),
            req.period_end.as_deref(),
            today(),
        )?;

        let started = Instant::now();
        let report = Aggregator::new(&*state.sessions, &*state.summaries)
            .compute_for_user(&user_id, period, Utc::now())
            .await;
        record_aggregation(&report, started.elapsed());

        let failed = report.failed_domains().count();
        tracing::info!(
            user_id = %user_id,
            period_start = %period.start,
            period_end = %period.end,
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Computed domain summaries"
        );

        Ok(Json(ComputeResponse::from(report)))
    }
    .await;
    timer.finish(&result);
    result
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/analysis/domains/{user_id}", get(get_domains))
        .route("/analysis/compute-user", post(compute_user))
}
