//! API route handlers for the cogtrain server.

pub mod analysis;
pub mod health;
pub mod metrics;
pub mod records;
pub mod sessions;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined router: API routes under `/api`, metrics at the root.
///
/// Routes:
/// - GET   /api/health - Liveness
/// - GET   /api/analysis/domains/{user_id} - Stored per-domain summaries for a window
/// - POST  /api/analysis/compute-user - Recompute and persist every domain
/// - POST  /api/sessions - Append a game session
/// - GET   /api/sessions/{user_id} - Recent sessions, newest first
/// - GET   /api/records/{table} - List the caller's rows
/// - POST  /api/records/{table} - Insert a row
/// - GET   /api/records/{table}/{id} - Fetch one row
/// - PATCH /api/records/{table}/{id} - Update writable fields
/// - GET   /metrics - Prometheus exposition
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", analysis::router())
        .nest("/api", sessions::router())
        .nest("/api", records::router())
        .merge(metrics::router())
        .with_state(state)
}
