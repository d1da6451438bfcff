//! Application metrics for Prometheus monitoring.
//!
//! This module provides:
//! - Prometheus metrics recorder initialization
//! - Request and aggregation metric helpers
//! - Rendering for the `/metrics` endpoint

use axum::{http::StatusCode, Json};
use cogtrain_core::AggregationReport;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::error::ApiResult;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Returns `true` if this call installed the recorder, `false` if metrics
/// were already initialized. Concurrent callers wait for the first one.
pub fn init_metrics() -> bool {
    let mut installed = false;
    PROMETHEUS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("Failed to set global metrics recorder (already set)");
        } else {
            describe_metrics();
            installed = true;
        }
        handle
    });

    if installed {
        tracing::info!("Prometheus metrics initialized");
    }
    installed
}

fn describe_metrics() {
    describe_counter!("api_requests_total", "Total number of API requests");
    describe_histogram!(
        "api_request_duration_seconds",
        "Duration of API requests in seconds"
    );
    describe_counter!(
        "domain_aggregations_total",
        "Per-domain aggregation results by outcome"
    );
    describe_histogram!(
        "aggregation_duration_seconds",
        "Duration of a full compute-user run in seconds"
    );
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

/// Record a completed API request.
pub fn record_request(endpoint: &'static str, status: u16, duration: Duration) {
    counter!("api_requests_total", "endpoint" => endpoint, "status" => status.to_string())
        .increment(1);
    histogram!("api_request_duration_seconds", "endpoint" => endpoint)
        .record(duration.as_secs_f64());
}

/// Record one compute-user run: an outcome counter per domain plus the
/// run's wall time.
pub fn record_aggregation(report: &AggregationReport, duration: Duration) {
    for (domain, outcome) in &report.outcomes {
        let outcome = match outcome.kind() {
            cogtrain_core::OutcomeKind::Computed => "computed",
            cogtrain_core::OutcomeKind::Empty => "empty",
            cogtrain_core::OutcomeKind::Failed => "failed",
        };
        counter!(
            "domain_aggregations_total",
            "domain" => domain.as_str(),
            "outcome" => outcome
        )
        .increment(1);
    }
    histogram!("aggregation_duration_seconds").record(duration.as_secs_f64());
}

/// Status a successful handler result is sent with.
pub trait SuccessStatus {
    fn success_status(&self) -> StatusCode;
}

impl<T> SuccessStatus for Json<T> {
    fn success_status(&self) -> StatusCode {
        StatusCode::OK
    }
}

impl<T> SuccessStatus for (StatusCode, T) {
    fn success_status(&self) -> StatusCode {
        self.0
    }
}

impl SuccessStatus for () {
    fn success_status(&self) -> StatusCode {
        StatusCode::OK
    }
}

fn result_status<T: SuccessStatus>(result: &ApiResult<T>) -> u16 {
    match result {
        Ok(response) => response.success_status().as_u16(),
        Err(e) => e.status().as_u16(),
    }
}

/// Times a handler and records it under `endpoint` when finished.
pub struct RequestTimer {
    endpoint: &'static str,
    start: Instant,
}

impl RequestTimer {
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Record with the status of `result`'s eventual response.
    pub fn finish<T: SuccessStatus>(self, result: &ApiResult<T>) {
        record_request(self.endpoint, result_status(result), self.start.elapsed());
    }
}
