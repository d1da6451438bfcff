// crates/server/src/routes/health.rs
//! `GET /api/health`: unauthenticated liveness for the cogtrain service.
//!
//! Always 200 while the process serves requests. Database reachability is
//! reported in the body.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub database_reachable: bool,
}

impl HealthResponse {
    fn new(uptime_secs: u64, database_reachable: bool) -> Self {
        Self {
            status: if database_reachable {
                ServiceStatus::Ok
            } else {
                ServiceStatus::Degraded
            },
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs,
            database_reachable,
        }
    }
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database_reachable = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            false
        }
    };
    Json(HealthResponse::new(state.uptime_secs(), database_reachable))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}
