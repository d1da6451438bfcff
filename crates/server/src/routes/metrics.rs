// crates/server/src/routes/metrics.rs
//! `GET /metrics`: scrape target for the request timers and the per-domain
//! aggregation counters recorded in [`crate::metrics`].
//!
//! Served at the root, beside `/api`, and without a token.

use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::metrics::render_metrics;
use crate::state::AppState;

const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// 503 until `init_metrics` has installed the recorder.
pub async fn scrape() -> Response {
    let Some(body) = render_metrics() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Metrics recorder not installed").into_response();
    };
    ([(header::CONTENT_TYPE, PROMETHEUS_TEXT)], body).into_response()
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/metrics", get(scrape))
}
